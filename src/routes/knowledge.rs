use super::chat::{require_api_key, resolve_model, stream_response};
use super::AppState;
use crate::doc_processor::{chunk_text, is_pdf_filename};
use crate::embedding::VectorIndex;
use crate::error::ApiError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::store::models::DocumentSummary;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub pdf_id: String,
    pub filename: String,
    pub chunks_created: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PdfChatBody {
    pub user_message: String,
    pub pdf_id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_top_k")]
    pub k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfList {
    pub pdfs: Vec<DocumentSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn processing(e: impl std::fmt::Display) -> ApiError {
    ApiError::Processing(format!("Error processing PDF: {}", e))
}

fn upload_error(e: MultipartError, limit_mb: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("Upload exceeds the {} MB limit", limit_mb))
    } else {
        ApiError::Validation(format!("Invalid upload: {}", e))
    }
}

/// System prompt that confines the answer to the retrieved chunks.
pub fn context_prompt(chunks: &[String]) -> String {
    format!(
        "You are a helpful assistant that answers questions based on the provided document context.\n\
         Use the following context to answer the user's question. \
         If the answer cannot be found in the context, say so.\n\n\
         Context:\n{}",
        chunks.join("\n\n")
    )
}

pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut api_key = String::new();
    let limit_mb = state.config.max_upload_mb;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| upload_error(e, limit_mb))?;
                file = Some((filename, data));
            }
            "api_key" => {
                api_key = field
                    .text()
                    .await
                    .map_err(|e| upload_error(e, limit_mb))?;
            }
            _ => {}
        }
    }

    require_api_key(&api_key)?;
    let (filename, data) =
        file.ok_or_else(|| ApiError::Validation("A PDF file is required".into()))?;
    if !is_pdf_filename(&filename) {
        return Err(ApiError::Validation("Only PDF files are allowed".into()));
    }

    let extract = state.extractor;
    let text = tokio::task::spawn_blocking(move || extract(&data))
        .await
        .map_err(processing)?
        .map_err(processing)?;
    if text.trim().is_empty() {
        return Err(ApiError::Validation(
            "PDF appears to be empty or unreadable".into(),
        ));
    }

    let config = &state.config;
    let chunks = chunk_text(&text, config.chunk_size, config.chunk_overlap);
    let index = VectorIndex::build(
        state.llm.as_ref(),
        &api_key,
        chunks,
        &config.embedding_model,
        config.embed_batch_size,
        config.embed_concurrency,
    )
    .await
    .map_err(processing)?;

    let entry = state.store.insert(&filename, index).await;
    tracing::info!(pdf_id = %entry.id, chunks = entry.index.len(), "indexed {}", filename);

    Ok(Json(UploadResponse {
        pdf_id: entry.id.clone(),
        filename,
        chunks_created: entry.index.len(),
        message: "PDF successfully uploaded and indexed".into(),
    }))
}

pub async fn chat_with_pdf(
    State(state): State<AppState>,
    Json(body): Json<PdfChatBody>,
) -> Result<Response, ApiError> {
    let entry = state.store.get(&body.pdf_id).await.ok_or_else(|| {
        ApiError::NotFound("PDF not found. Please upload a PDF first.".into())
    })?;
    require_api_key(&body.api_key)?;
    if body.k == 0 {
        return Err(ApiError::Validation("k must be at least 1".into()));
    }

    let chunks = entry
        .index
        .search_by_text(state.llm.as_ref(), &body.api_key, &body.user_message, body.k)
        .await?;
    tracing::debug!(pdf_id = %entry.id, retrieved = chunks.len(), "retrieved context");

    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(context_prompt(&chunks)),
            ChatMessage::user(body.user_message),
        ],
        model: resolve_model(&state, body.model),
        temperature: None,
        max_tokens: None,
    };

    let stream = state.llm.chat_stream(&body.api_key, &request).await?;
    Ok(stream_response(stream))
}

pub async fn list_pdfs(State(state): State<AppState>) -> Json<PdfList> {
    Json(PdfList {
        pdfs: state.store.list().await,
    })
}

pub async fn delete_pdf(
    State(state): State<AppState>,
    Path(pdf_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let entry = state
        .store
        .remove(&pdf_id)
        .await
        .ok_or_else(|| ApiError::NotFound("PDF not found".into()))?;
    tracing::info!(pdf_id = %pdf_id, "deleted {}", entry.filename);

    Ok(Json(MessageResponse {
        message: format!("PDF '{}' successfully deleted", entry.filename),
    }))
}
