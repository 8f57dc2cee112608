use axum::{
    extract::State,
    routing::{delete, get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{Dashboard, PopularParams, StatusUpdateRequest},
    repo,
};
use crate::{
    auth::{repo_types::User, AdminUser},
    dto::Ack,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    listings::{
        repo as listings_repo,
        repo_types::{Listing, ListingStatus},
    },
    state::AppState,
};

pub const POPULAR_LIMIT: i64 = 50;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/listings", get(list_listings))
        .route("/admin/listings/:id", get(get_listing).delete(delete_listing))
        .route("/admin/listings/:id/status", put(set_listing_status))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/popular-listings", get(popular_listings))
        .route("/admin/pending-listings", get(pending_listings))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(User::list_all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Ack>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!(admin_id = %admin.id, user_id = %id, "user deleted");
    Ok(Json(Ack::new("User deleted")))
}

#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Listing>>> {
    Ok(Json(listings_repo::list_all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Listing>> {
    listings_repo::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Listing not found"))
}

#[instrument(skip(state))]
pub async fn delete_listing(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Ack>> {
    if !listings_repo::delete_any(&state.db, id).await? {
        return Err(ApiError::not_found("Listing not found"));
    }
    info!(admin_id = %admin.id, listing_id = %id, "listing deleted by admin");
    Ok(Json(Ack::new("Listing deleted")))
}

/// Publishes or unpublishes a listing.
#[instrument(skip(state, body))]
pub async fn set_listing_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusUpdateRequest>,
) -> ApiResult<Json<Listing>> {
    let listing = listings_repo::set_status(&state.db, id, body.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;
    info!(admin_id = %admin.id, listing_id = %id, status = ?body.status, "listing status changed");
    Ok(Json(listing))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(repo::dashboard(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn popular_listings(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(params): AppQuery<PopularParams>,
) -> ApiResult<Json<Vec<Listing>>> {
    let limit = params.limit.unwrap_or(POPULAR_LIMIT).clamp(1, POPULAR_LIMIT);
    Ok(Json(listings_repo::list_popular(&state.db, limit).await?))
}

#[instrument(skip(state))]
pub async fn pending_listings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Listing>>> {
    Ok(Json(
        listings_repo::list_by_status(&state.db, ListingStatus::Pending).await?,
    ))
}
