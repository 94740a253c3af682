pub mod chat;
pub mod knowledge;

use crate::config::{Config, Variant};
use crate::doc_processor;
use crate::llm::LlmClient;
use crate::store::DocumentStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Turns uploaded PDF bytes into plain text.
pub type PdfExtractor = fn(&[u8]) -> Result<String, String>;

/// Shared handler state: upstream client, document registry and settings.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub store: Arc<DocumentStore>,
    pub config: Arc<Config>,
    pub extractor: PdfExtractor,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            store: Arc::new(DocumentStore::new()),
            config: Arc::new(config),
            extractor: doc_processor::extract_uploaded_pdf,
        }
    }

    pub fn with_extractor(mut self, extractor: PdfExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

/// Build the HTTP router for the configured service variant.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/health", get(health));

    if state.config.variant == Variant::Rag {
        app = app
            .route("/api/upload-pdf", post(knowledge::upload_pdf))
            .route("/api/chat-with-pdf", post(knowledge::chat_with_pdf))
            .route("/api/pdfs", get(knowledge::list_pdfs))
            .route("/api/pdf/:pdf_id", delete(knowledge::delete_pdf));
    }

    app.layer(DefaultBodyLimit::max(state.config.max_upload_bytes()))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin, method and header, with credentials. Credentials forbid the
/// `*` wildcard, so the request's own values are echoed back.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
