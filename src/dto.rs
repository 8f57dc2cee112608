use serde::Serialize;

/// `{"message": "..."}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
