use crate::doc_processor::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::llm::openai::DEFAULT_BASE_URL;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tokio::net::TcpListener;

/// Which endpoints the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Direct chat only
    Chat,
    /// Direct chat plus PDF upload and retrieval chat
    Rag,
}

impl Variant {
    pub fn default_model(self) -> &'static str {
        match self {
            Variant::Chat => "gpt-4.1-mini",
            Variant::Rag => "gpt-4o-mini",
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "pdf-chat", version, about = "Streaming chat and PDF RAG chat server")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, env = "SERVICE_VARIANT", value_enum, default_value_t = Variant::Rag)]
    pub variant: Variant,

    /// Completion model used when a request names none [default: per variant]
    #[arg(long, env = "DEFAULT_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Maximum chunk length in characters
    #[arg(long, env = "CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    /// Texts sent per embeddings request
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = 20)]
    pub embed_batch_size: usize,

    /// Embeddings requests in flight at once during an upload
    #[arg(long, env = "EMBED_CONCURRENCY", default_value_t = 4)]
    pub embed_concurrency: usize,

    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,

    /// Overall timeout for upstream API calls; none by default
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
    #[error("embedding batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("embedding concurrency must be greater than zero")]
    ZeroConcurrency,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            variant: Variant::Rag,
            model: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            embed_batch_size: 20,
            embed_concurrency: 4,
            max_upload_mb: 25,
            upstream_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.embed_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn default_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.variant.default_model().to_string())
    }

    /// Bind the listen socket. `host` may be a name such as `localhost`.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port)).await
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::try_parse_from(["pdf-chat"]).unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.variant, Variant::Rag);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_model_per_variant() {
        let rag = Config::default();
        assert_eq!(rag.default_model(), "gpt-4o-mini");

        let chat = Config {
            variant: Variant::Chat,
            ..Config::default()
        };
        assert_eq!(chat.default_model(), "gpt-4.1-mini");

        let overridden = Config {
            model: Some("gpt-4o".into()),
            ..chat
        };
        assert_eq!(overridden.default_model(), "gpt-4o");
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        let config = Config {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapTooLarge {
                size: 100,
                overlap: 100
            })
        );
    }

    #[tokio::test]
    async fn test_bind_resolves_host_names() {
        let config = Config {
            host: "localhost".into(),
            port: 0,
            ..Config::default()
        };
        let listener = config.bind().await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = Config {
            embed_concurrency: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }
}
