/// LLM Client — the single point of entry for all text-generation calls in SkillGap.
///
/// ARCHITECTURAL RULE: No other module may call the chat-completions API directly.
/// All LLM interactions MUST go through `TextGenerator`, so every caller can fall back
/// to deterministic output when the service is absent or misbehaves.
///
/// The endpoint is OpenAI-compatible (Groq by default). Calls are never retried:
/// a failed call triggers exactly one fallback in the caller.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod recovery;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Model used for the semantic JD-vs-résumé comparison.
pub const SEMANTIC_MODEL: &str = "llama-3.3-70b-versatile";
/// Model used for remediation plan generation.
pub const PLAN_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl LlmError {
    /// HTTP status reported by the service, if the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub model: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub const SEMANTIC_MATCH: Self = Self {
        model: SEMANTIC_MODEL,
        temperature: 0.1,
        top_p: 1.0,
        max_tokens: 800,
    };

    pub const PLAN: Self = Self {
        model: PLAN_MODEL,
        temperature: 0.25,
        top_p: 0.95,
        max_tokens: 3000,
    };
}

/// One system + user exchange sent to the generator.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub params: GenerationParams,
}

/// The text-generation seam. `LlmClient` is the production backend; tests script their own.
///
/// Carried in `AppState` as `Option<Arc<dyn TextGenerator>>` (absent when no credential is set).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the raw text content of the first choice. The text is expected to be JSON
    /// but is not guaranteed to be; callers run it through `recovery::coerce_json`.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_url,
        })
    }

    /// Makes a single call to the chat-completions API, returning the full response object.
    pub async fn call(&self, request: CompletionRequest<'_>) -> Result<ChatResponse, LlmError> {
        let body = build_chat_request(&request);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                request.params.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        // Missing content is passed on as empty text; recovery reports it as `empty_input`.
        Ok(response.text().unwrap_or_default().to_string())
    }
}

fn build_chat_request<'a>(request: &CompletionRequest<'a>) -> ChatRequest<'a> {
    ChatRequest {
        model: request.params.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: request.system,
            },
            ChatMessage {
                role: "user",
                content: request.prompt,
            },
        ],
        temperature: request.params.temperature,
        max_completion_tokens: request.params.max_tokens,
        top_p: request.params.top_p,
        stream: false,
    }
}

/// Prefers the structured `{"error": {"message": ..}}` body, falling back to the raw text.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
pub mod mock {
    //! Scripted generators for exercising fallback paths without network access.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    type Script = Box<dyn Fn(&CompletionRequest<'_>) -> Result<String, LlmError> + Send + Sync>;

    pub struct ScriptedGenerator {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        pub fn new(
            script: impl Fn(&CompletionRequest<'_>) -> Result<String, LlmError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                script: Box::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        /// Always answers with the same text.
        pub fn replying(text: &str) -> Self {
            let text = text.to_string();
            Self::new(move |_| Ok(text.clone()))
        }

        /// Always fails with the given HTTP status.
        pub fn failing(status: u16) -> Self {
            Self::new(move |_| {
                Err(LlmError::Api {
                    status,
                    message: "service unavailable".to_string(),
                })
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.script)(&request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_openai_shape() {
        let request = CompletionRequest {
            system: "json only",
            prompt: "compare these",
            params: GenerationParams::SEMANTIC_MATCH,
        };
        let value = serde_json::to_value(build_chat_request(&request)).unwrap();

        assert_eq!(value["model"], SEMANTIC_MODEL);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "compare these");
        assert_eq!(value["max_completion_tokens"], 800);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_chat_response_text_takes_first_choice() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"a\": 1}"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{\"a\": 1}"));
        assert_eq!(response.usage.unwrap().completion_tokens, 4);
    }

    #[test]
    fn test_chat_response_without_choices_has_no_text() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_parse_error_message_structured() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(parse_error_message(body), "Invalid API Key");
    }

    #[test]
    fn test_parse_error_message_plain_text() {
        assert_eq!(parse_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_api_error_exposes_status() {
        let err = LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
    }
}
