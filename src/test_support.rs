//! Helpers for router-level tests.
//!
//! `send`/`send_json` run the router over `AppState::fake()`, whose pool never
//! connects, so they only suit requests that resolve before the database.
//! Tests that need real rows call `live_state()` and the `*_to` variants.

use std::sync::OnceLock;

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgConnection,
};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::jwt::JwtKeys,
    auth::repo_types::{Role, User},
    listings::{
        repo as listings_repo,
        repo_types::{Listing, ListingStatus, ListingType},
        services::NewListing,
    },
    state::AppState,
};

static PROVISION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn keys() -> JwtKeys {
    let state = AppState::fake();
    JwtKeys::from_ref(&state)
}

pub fn token_for(user_id: Uuid, role: Role) -> String {
    keys().sign_access(user_id, role).expect("sign access")
}

pub fn refresh_token_for(user_id: Uuid, role: Role) -> String {
    keys().sign_refresh(user_id, role).expect("sign refresh")
}

pub fn user_token() -> String {
    token_for(Uuid::new_v4(), Role::User)
}

pub fn admin_token() -> String {
    token_for(Uuid::new_v4(), Role::Admin)
}

/// State over a freshly created and migrated database on the server named by
/// `TEST_DATABASE_URL` (its role needs CREATEDB). Returns `None` when the
/// variable is unset so database tests skip instead of failing; once it is
/// set, any setup failure panics.
pub async fn live_state() -> Option<AppState> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("SKIP-TEST-DB: TEST_DATABASE_URL is not set");
        return None;
    };
    let server: PgConnectOptions = url.parse().expect("parse TEST_DATABASE_URL");
    let name = format!("rentals_test_{}", Uuid::new_v4().simple());

    {
        let _guard = PROVISION_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .await;
        let mut admin = PgConnection::connect_with(&server)
            .await
            .expect("connect TEST_DATABASE_URL");
        sqlx::query(&format!(r#"CREATE DATABASE "{name}""#))
            .execute(&mut admin)
            .await
            .expect("create test database");
        admin.close().await.ok();
    }

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(server.database(&name))
        .await
        .expect("connect test database");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("run migrations");
    Some(AppState::with_pool(db))
}

/// Inserts a user row directly (no password hashing) and returns its id with
/// an access token.
pub async fn seed_user(state: &AppState, role: Role) -> (Uuid, String) {
    let email = format!("{}@example.tn", Uuid::new_v4().simple());
    let user = User::create(&state.db, &email, "Seeded", "unusable-hash")
        .await
        .expect("seed user");
    if role == Role::Admin {
        sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
            .bind(user.id)
            .execute(&state.db)
            .await
            .expect("promote admin");
    }
    (user.id, token_for(user.id, role))
}

pub fn flat_in_tunis() -> NewListing {
    NewListing {
        title: "Flat".into(),
        address: None,
        city: "Tunis".into(),
        commune: None,
        listing_type: ListingType::Monthly,
        price: 500.0,
        description: None,
        images: Vec::new(),
        phone: "+21612345678".into(),
        is_test: false,
    }
}

pub async fn seed_listing(
    state: &AppState,
    owner: Uuid,
    listing: &NewListing,
    status: ListingStatus,
) -> Listing {
    let created = listings_repo::insert(&state.db, owner, listing)
        .await
        .expect("seed listing");
    if status == ListingStatus::Pending {
        return created;
    }
    listings_repo::set_status(&state.db, created.id, status)
        .await
        .expect("set listing status")
        .expect("seeded listing exists")
}

async fn dispatch(state: AppState, req: Request<Body>) -> (StatusCode, Value) {
    let app = build_app(state);
    let res = app.oneshot(req).await.expect("router is infallible");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b
}

pub async fn send_to(
    state: &AppState,
    method: Method,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = builder(method, uri, token)
        .body(Body::empty())
        .expect("request");
    dispatch(state.clone(), req).await
}

pub async fn send_json_to(
    state: &AppState,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let req = builder(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    dispatch(state.clone(), req).await
}

pub async fn send(method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send_to(&AppState::fake(), method, uri, token).await
}

pub async fn send_json(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    send_json_to(&AppState::fake(), method, uri, token, body).await
}
