use super::AppState;
use crate::error::ApiError;
use crate::llm::{ChatMessage, ChatRequest, TextStream};
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::{future, TryStreamExt};
use serde::Deserialize;

pub const CHAT_TEMPERATURE: f32 = 1.2;
pub const CHAT_MAX_TOKENS: u32 = 350;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub developer_message: String,
    pub user_message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: String,
}

pub(crate) fn require_api_key(api_key: &str) -> Result<(), ApiError> {
    if api_key.trim().is_empty() {
        return Err(ApiError::Validation("API key is required".into()));
    }
    Ok(())
}

/// Requested model, falling back to the configured default when absent or blank.
pub(crate) fn resolve_model(state: &AppState, model: Option<String>) -> String {
    model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.config.default_model())
}

/// Forward non-empty fragments to the client as a `text/plain` body as they arrive.
///
/// Headers are already sent once the first fragment goes out, so an upstream
/// failure after that point can only end the body early.
pub(crate) fn stream_response(stream: TextStream) -> Response {
    let body = stream
        .try_filter(|fragment| future::ready(!fragment.is_empty()))
        .map_ok(Bytes::from)
        .inspect_err(|e| tracing::error!("response stream aborted: {}", e));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    require_api_key(&body.api_key)?;

    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(body.developer_message),
            ChatMessage::user(body.user_message),
        ],
        model: resolve_model(&state, body.model),
        temperature: Some(CHAT_TEMPERATURE),
        max_tokens: Some(CHAT_MAX_TOKENS),
    };
    tracing::info!(model = %request.model, "chat request");

    let stream = state.llm.chat_stream(&body.api_key, &request).await?;
    Ok(stream_response(stream))
}
