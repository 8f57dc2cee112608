use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    repo::{self, Decision},
    repo_types::{ApprovalRequestWithUser, ApprovalStatus},
};
use crate::{
    auth::{AdminUser, AuthUser},
    dto::Ack,
    error::{caller_write_error, is_unique_violation, ApiError, ApiResult},
    extract::AppPath,
    state::AppState,
};

pub fn approval_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(submit_request))
        .route("/requests/:id/approve", patch(approve_request))
        .route("/requests/:id/reject", patch(reject_request))
}

fn already_pending() -> ApiError {
    ApiError::Conflict("You already have a pending request.".into())
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn submit_request(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<(StatusCode, Json<Ack>)> {
    if repo::find_pending_for_user(&state.db, caller.id).await?.is_some() {
        warn!("duplicate approval request");
        return Err(already_pending());
    }

    match repo::insert_pending(&state.db, caller.id).await {
        Ok(request) => {
            info!(request_id = %request.id, "approval request submitted");
            Ok((
                StatusCode::CREATED,
                Json(Ack::new("Approval request submitted.")),
            ))
        }
        Err(e) if is_unique_violation(&e) => Err(already_pending()),
        Err(e) => Err(caller_write_error(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<ApprovalRequestWithUser>>> {
    Ok(Json(repo::list_with_users(&state.db).await?))
}

async fn decide(state: &AppState, id: Uuid, next: ApprovalStatus) -> ApiResult<()> {
    match repo::decide(&state.db, id, next).await? {
        Decision::Applied(request) => {
            info!(request_id = %id, user_id = %request.user_id, status = ?next, "approval request decided");
            Ok(())
        }
        Decision::Missing => Err(ApiError::not_found("Request not found")),
        Decision::NotAllowed(current) => {
            warn!(request_id = %id, current = ?current, wanted = ?next, "approval transition refused");
            Err(ApiError::Conflict("Request already processed".into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn approve_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Ack>> {
    decide(&state, id, ApprovalStatus::Approved).await?;
    Ok(Json(Ack::new("User approved.")))
}

#[instrument(skip(state))]
pub async fn reject_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Ack>> {
    decide(&state, id, ApprovalStatus::Rejected).await?;
    Ok(Json(Ack::new("Request rejected.")))
}
