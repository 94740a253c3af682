pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A completion request. Sampling fields left as `None` use the model defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Incremental text fragments of a streamed completion, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// Upstream model API. Every call carries the caller's own credential.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Start a streamed completion. Resolves once the upstream has accepted
    /// the request, so rejections surface here rather than inside the stream.
    async fn chat_stream(&self, api_key: &str, request: &ChatRequest)
        -> Result<TextStream, LlmError>;

    /// Embed `texts` with `model`, one vector per input in input order.
    async fn embed(
        &self,
        api_key: &str,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Upstream stream error: {0}")]
    Stream(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
