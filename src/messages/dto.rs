use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Conversation, Message};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub recipient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
