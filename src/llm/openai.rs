use super::{ChatRequest, LlmClient, LlmError, TextStream};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible `/chat/completions` and `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [super::ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiStreamResponse {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiStreamError {
    error: OpenAiErrorBody,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn post(&self, path: &str, api_key: &str) -> RequestBuilder {
        let req = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .header("Content-Type", "application/json");

        if api_key.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", api_key))
        }
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    Err(LlmError::Api { status, message })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_stream(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<TextStream, LlmError> {
        let body = OpenAiRequest {
            model: &request.model,
            messages: &request.messages,
            stream: true,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self.post("chat/completions", api_key).json(&body).send().await?;
        let resp = check_status(resp).await?;
        tracing::debug!(model = %request.model, "upstream accepted completion request");

        let state = (
            Box::pin(resp.bytes_stream()),
            SseDecoder::default(),
            VecDeque::new(),
        );
        let stream = futures::stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
            loop {
                if let Some(fragment) = pending.pop_front() {
                    return Some((Ok(fragment), (bytes, decoder, pending)));
                }
                if let Some(e) = decoder.take_error() {
                    return Some((Err(e), (bytes, decoder, pending)));
                }
                if decoder.is_done() {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        decoder.finish();
                        return Some((Err(LlmError::Http(e)), (bytes, decoder, pending)));
                    }
                    None => return None,
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn embed(
        &self,
        api_key: &str,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = EmbeddingRequest { model, input: texts };

        let resp = self.post("embeddings", api_key).json(&body).send().await?;
        let resp = check_status(resp).await?;

        let mut data: EmbeddingResponse = resp.json().await?;
        if data.data.len() != texts.len() {
            return Err(LlmError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.data.len()
            )));
        }
        data.data.sort_by_key(|d| d.index);
        Ok(data.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Incremental decoder for the server-sent-event body of a streamed completion.
///
/// Bytes are buffered until a full line is available, so both `data:` lines and
/// multi-byte characters may be split across network chunks. An `error` event
/// ends decoding; it is held until the fragments before it have been taken.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
    error: Option<LlmError>,
}

impl SseDecoder {
    /// Feed the next network chunk, returning the text fragments it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut fragments = Vec::new();
        if self.done {
            return fragments;
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();

            if data == "[DONE]" {
                self.finish();
                break;
            }

            match serde_json::from_str::<OpenAiStreamResponse>(data) {
                Ok(parsed) => {
                    if let Some(choice) = parsed.choices.first() {
                        if let Some(content) = &choice.delta.content {
                            if !content.is_empty() {
                                fragments.push(content.clone());
                            }
                        }
                        if choice.finish_reason.is_some() {
                            self.finish();
                            break;
                        }
                    }
                }
                Err(e) => {
                    if let Ok(event) = serde_json::from_str::<OpenAiStreamError>(data) {
                        self.error = Some(LlmError::Stream(event.error.message));
                        self.finish();
                        break;
                    }
                    tracing::debug!("skipping unparsable stream event: {}", e);
                }
            }
        }

        fragments
    }

    pub(crate) fn finish(&mut self) {
        self.done = true;
        self.buffer.clear();
    }

    pub(crate) fn take_error(&mut self) -> Option<LlmError> {
        self.error.take()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }
}
