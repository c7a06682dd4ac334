use serde::{Deserialize, Serialize};

// https://core.telegram.org/bots/api#sendmessage
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Numeric chat id or `@channelusername`
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

// https://core.telegram.org/bots/api#making-requests
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponse<T> {
    pub(super) ok: bool,
    pub(super) result: Option<T>,
    pub(super) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SentMessage {
    pub(super) message_id: i64,
}
