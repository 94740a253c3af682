//! Streaming chat and PDF retrieval-augmented chat over HTTP.

pub mod config;
pub mod doc_processor;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod routes;
pub mod store;

pub use config::{Config, Variant};
pub use error::ApiError;
pub use routes::{router, AppState};
