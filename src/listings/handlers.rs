use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        ContactClickResponse, CreateListingRequest, ListingPage, ReviewRequest, SearchParams,
        UpdateListingRequest,
    },
    repo,
    repo_types::Listing,
    services::{normalize_search, parse_rating, validate_new_listing, validate_price, PageWindow},
};
use crate::{
    auth::AuthUser,
    dto::Ack,
    error::{caller_write_error, ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(create_listing).get(search_listings))
        .route("/listings/me", get(my_listings))
        .route(
            "/listings/:id",
            get(get_published).put(update_listing).delete(delete_listing),
        )
        .route("/listings/:id/contact-click", post(track_contact_click))
        .route("/listings/:id/reviews", post(add_review))
}

fn listing_not_found() -> ApiError {
    ApiError::not_found("Listing not found")
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn create_listing(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(body): AppJson<CreateListingRequest>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let new_listing = validate_new_listing(body).map_err(|e| {
        warn!(error = %e, "listing rejected");
        e
    })?;
    let listing = repo::insert(&state.db, caller.id, &new_listing)
        .await
        .map_err(caller_write_error)?;
    info!(listing_id = %listing.id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state))]
pub async fn search_listings(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<Json<ListingPage>> {
    let window = PageWindow::new(params.page, params.limit);
    let search = normalize_search(params.search);
    let (listings, total) =
        repo::search_published(&state.db, params.listing_type, search.as_deref(), window).await?;
    let has_more = window.has_more(listings.len(), total);
    Ok(Json(ListingPage { listings, has_more }))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn my_listings(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Listing>>> {
    Ok(Json(repo::list_by_owner(&state.db, caller.id).await?))
}

#[instrument(skip(state))]
pub async fn get_published(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Listing>> {
    repo::find_published(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Listing not found or not published"))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn update_listing(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateListingRequest>,
) -> ApiResult<Json<Listing>> {
    if let Some(price) = body.price {
        validate_price(price)?;
    }
    for (value, field) in [
        (&body.title, "title"),
        (&body.city, "city"),
        (&body.phone, "phone"),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ApiError::bad_request(format!("{field} cannot be empty")));
        }
    }

    let listing = repo::update_owned(&state.db, caller.id, id, &body)
        .await?
        .ok_or_else(listing_not_found)?;
    info!(listing_id = %id, "listing updated");
    Ok(Json(listing))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn delete_listing(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Ack>> {
    if !repo::delete_owned(&state.db, caller.id, id).await? {
        return Err(listing_not_found());
    }
    info!(listing_id = %id, "listing deleted");
    Ok(Json(Ack::new("Listing deleted")))
}

#[instrument(skip(state))]
pub async fn track_contact_click(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ContactClickResponse>> {
    let contact_clicks = repo::increment_contact_clicks(&state.db, id)
        .await?
        .ok_or_else(listing_not_found)?;
    Ok(Json(ContactClickResponse {
        message: "Click tracked".into(),
        contact_clicks,
    }))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn add_review(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ReviewRequest>,
) -> ApiResult<Json<Listing>> {
    let rating = parse_rating(&body.rating)?;
    let listing = repo::append_review(&state.db, id, caller.id, rating)
        .await?
        .ok_or_else(listing_not_found)?;
    info!(listing_id = %id, rating, "review added");
    Ok(Json(listing))
}
