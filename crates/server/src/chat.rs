//! LLM assistant backed by the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{
    rolling_history, AppError, ChatMessage, ChatReply, ChatRequest, ChatRole, ChatSettings,
    TRUNCATION_NOTICE,
};

/// Longest user message forwarded to the model.
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Answer `message` given the preceding turns (oldest first).
    async fn complete(&self, history: &[ChatMessage], message: &str)
        -> Result<ChatReply, AppError>;
}

/// Validate a chat request and forward it with a bounded history window.
pub async fn respond(model: &dyn ChatModel, req: &ChatRequest) -> Result<ChatReply, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::field("message", "Message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::field(
            "message",
            format!("Message must be at most {MAX_MESSAGE_CHARS} characters"),
        ));
    }
    model.complete(rolling_history(&req.history), message).await
}

/// Mark a reply the model cut short.
fn patch_truncated(mut text: String) -> String {
    text.push('…');
    text.push_str(TRUNCATION_NOTICE);
    text
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    }
}

/// Turn a decoded response into a reply, or the error it represents.
fn interpret(resp: GenerateResponse) -> Result<ChatReply, AppError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::info!(reason = %reason, "chat prompt blocked");
        return Err(AppError::chat_blocked(format!("Prompt blocked: {reason}")));
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::upstream("Chat model returned no candidates"))?;

    let finish = candidate.finish_reason.unwrap_or_default();
    if matches!(finish.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
        return Err(AppError::chat_blocked(format!("Answer blocked: {finish}")));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if finish == "MAX_TOKENS" {
        return Ok(ChatReply {
            text: patch_truncated(text),
            truncated: true,
        });
    }
    if text.trim().is_empty() {
        return Err(AppError::upstream("Chat model returned an empty answer"));
    }
    Ok(ChatReply {
        text,
        truncated: false,
    })
}

/// HTTP client for Gemini.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    system_prompt: String,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(settings: &ChatSettings, api_key: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build chat client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                settings.base_url.trim_end_matches('/'),
                settings.model
            ),
            api_key,
            system_prompt: settings.system_prompt.clone(),
            max_output_tokens: settings.max_output_tokens,
        })
    }

    fn build_request(&self, history: &[ChatMessage], message: &str) -> GenerateRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|m| Content {
                role: Some(wire_role(m.role)),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part {
                text: message.to_string(),
            }],
        });

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.system_prompt.clone(),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatReply, AppError> {
        let body = self.build_request(history, message);

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "chat request failed");
                AppError::upstream(format!("Chat request failed: {e}"))
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::rate_limited("Chat model quota exceeded"));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat model returned an error status");
            return Err(AppError::upstream(format!("Chat model failed with status {status}")));
        }

        let decoded: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid chat response: {e}")))?;

        interpret(decoded)
    }
}
