use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::{repo_types::User, AuthUser},
    error::{ApiError, ApiResult},
    extract::AppJson,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/me", get(get_profile).put(update_profile))
        .route("/users/me", get(get_profile))
}

/// Fields a user may change on their own account.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn get_profile(State(state): State<AppState>, caller: AuthUser) -> ApiResult<Json<User>> {
    User::find_by_id(&state.db, caller.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("name cannot be empty"));
    }
    let user = User::update_profile(
        &state.db,
        caller.id,
        body.name.as_deref().map(str::trim),
        body.phone.as_deref(),
        body.profile_pic.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!("profile updated");
    Ok(Json(user))
}
