use uuid::Uuid;

use super::repo_types::ConversationRow;
use crate::error::ApiError;

/// Orders two user ids so an unordered pair always maps to the same key.
pub fn participant_pair(a: Uuid, b: Uuid) -> Result<(Uuid, Uuid), ApiError> {
    if a == b {
        return Err(ApiError::bad_request("Cannot start a conversation with yourself"));
    }
    Ok(if a < b { (a, b) } else { (b, a) })
}

pub fn message_content(content: Option<String>) -> Result<String, ApiError> {
    match content {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(ApiError::bad_request("Message content is required")),
    }
}

/// Existence and membership checks shared by message reads and writes.
pub fn ensure_participant(
    conversation: Option<ConversationRow>,
    user_id: Uuid,
) -> Result<ConversationRow, ApiError> {
    let conversation = conversation.ok_or_else(|| ApiError::not_found("Conversation not found"))?;
    if !conversation.has_participant(user_id) {
        return Err(ApiError::Forbidden(
            "You are not a participant in this conversation".into(),
        ));
    }
    Ok(conversation)
}
