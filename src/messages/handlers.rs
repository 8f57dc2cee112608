use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ConversationWithMessages, OpenConversationRequest, SendMessageRequest},
    repo,
    repo_types::{Conversation, Message},
    services::{ensure_participant, message_content, participant_pair},
};
use crate::{
    auth::{repo_types::User, AuthUser},
    error::{caller_write_error, ApiError, ApiResult},
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/messages/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route(
            "/messages/:conversation_id",
            get(list_messages).post(send_message),
        )
}

fn repo_write_error(e: anyhow::Error) -> ApiError {
    match e.downcast::<sqlx::Error>() {
        Ok(db_err) => caller_write_error(db_err),
        Err(other) => ApiError::Internal(other),
    }
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn list_conversations(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Conversation>>> {
    Ok(Json(repo::list_for_user(&state.db, caller.id).await?))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn open_conversation(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(body): AppJson<OpenConversationRequest>,
) -> ApiResult<Json<ConversationWithMessages>> {
    let recipient_id = body
        .recipient_id
        .ok_or_else(|| ApiError::bad_request("Recipient ID is required"))?;
    let pair = participant_pair(caller.id, recipient_id)?;

    if User::find_by_id(&state.db, recipient_id).await?.is_none() {
        warn!(%recipient_id, "conversation with unknown recipient");
        return Err(ApiError::not_found("Recipient not found"));
    }

    let conversation = repo::get_or_create(&state.db, pair)
        .await
        .map_err(repo_write_error)?;
    let messages = repo::list_messages(&state.db, conversation.id).await?;
    Ok(Json(ConversationWithMessages {
        conversation: conversation.into(),
        messages,
    }))
}

#[instrument(skip(state), fields(user_id = %caller.id))]
pub async fn list_messages(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(conversation_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = ensure_participant(repo::find(&state.db, conversation_id).await?, caller.id)?;
    Ok(Json(repo::list_messages(&state.db, conversation.id).await?))
}

#[instrument(skip(state, body), fields(user_id = %caller.id))]
pub async fn send_message(
    State(state): State<AppState>,
    caller: AuthUser,
    AppPath(conversation_id): AppPath<Uuid>,
    AppJson(body): AppJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let content = message_content(body.content).map_err(|e| {
        warn!("missing content in message body");
        e
    })?;
    let conversation = ensure_participant(repo::find(&state.db, conversation_id).await?, caller.id)?;

    let message = repo::append_message(&state.db, conversation.id, caller.id, &content)
        .await
        .map_err(repo_write_error)?;
    info!(conversation_id = %conversation.id, message_id = %message.id, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::auth::repo_types::{Role, User};
    use crate::test_support::{
        live_state, seed_user, send, send_json, send_json_to, send_to, token_for, user_token,
    };

    #[tokio::test]
    async fn open_requires_recipient() {
        let token = user_token();
        let (status, body) =
            send_json(Method::POST, "/api/messages/conversations", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Recipient ID is required");
    }

    #[tokio::test]
    async fn open_rejects_self_conversation() {
        let me = Uuid::new_v4();
        let token = token_for(me, Role::User);
        let (status, _) = send_json(
            Method::POST,
            "/api/messages/conversations",
            Some(&token),
            json!({ "recipientId": me }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_rejects_empty_content() {
        let token = user_token();
        let uri = format!("/api/messages/{}", Uuid::new_v4());
        for body in [json!({}), json!({ "content": "" }), json!({ "content": "  " })] {
            let (status, res) = send_json(Method::POST, &uri, Some(&token), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res["message"], "Message content is required");
        }
    }

    #[tokio::test]
    async fn conversations_require_auth() {
        let (status, _) = send(Method::GET, "/api/messages/conversations", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let uri = format!("/api/messages/{}", Uuid::new_v4());
        let (status, _) = send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn two_users_share_one_conversation() {
        let Some(state) = live_state().await else { return };
        let (a_id, a) = seed_user(&state, Role::User).await;
        let (b_id, b) = seed_user(&state, Role::User).await;
        let (_, outsider) = seed_user(&state, Role::User).await;
        let open = "/api/messages/conversations";

        let (status, from_a) =
            send_json_to(&state, Method::POST, open, Some(&a), json!({ "recipientId": b_id })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(from_a["messages"], json!([]));
        let (_, from_b) =
            send_json_to(&state, Method::POST, open, Some(&b), json!({ "recipientId": a_id })).await;
        assert_eq!(from_a["id"], from_b["id"]);

        let uri = format!("/api/messages/{}", from_a["id"].as_str().unwrap());
        let (status, sent) =
            send_json_to(&state, Method::POST, &uri, Some(&a), json!({ "content": "Is it free?" })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["sender"], a_id.to_string());

        let (status, messages) = send_to(&state, Method::GET, &uri, Some(&b)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(messages[0]["content"], "Is it free?");

        let (status, _) = send_to(&state, Method::GET, &uri, Some(&outsider)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) =
            send_json_to(&state, Method::POST, &uri, Some(&outsider), json!({ "content": "hi" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, listed) = send_to(&state, Method::GET, open, Some(&b)).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_recipient_and_deleted_caller() {
        let Some(state) = live_state().await else { return };
        let (caller_id, caller) = seed_user(&state, Role::User).await;
        let (recipient_id, _) = seed_user(&state, Role::User).await;
        let open = "/api/messages/conversations";

        let (status, _) = send_json_to(
            &state,
            Method::POST,
            open,
            Some(&caller),
            json!({ "recipientId": Uuid::new_v4() }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(User::delete(&state.db, caller_id).await.unwrap());
        let (status, body) = send_json_to(
            &state,
            Method::POST,
            open,
            Some(&caller),
            json!({ "recipientId": recipient_id }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User not found");
    }
}
