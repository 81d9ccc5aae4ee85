use serde::{Deserialize, Serialize};

/// How many prior turns are forwarded to the model.
pub const CHAT_HISTORY_LIMIT: usize = 10;

/// Appended to an answer the model cut short.
pub const TRUNCATION_NOTICE: &str =
    "\n\n(The answer was cut short. Ask me to continue for the rest.)";

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// The assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatReply {
    pub text: String,
    /// True when the model hit its output limit and the text was patched.
    pub truncated: bool,
}

/// The last `CHAT_HISTORY_LIMIT` turns, oldest first.
pub fn rolling_history(history: &[ChatMessage]) -> &[ChatMessage] {
    let start = history.len().saturating_sub(CHAT_HISTORY_LIMIT);
    &history[start..]
}
