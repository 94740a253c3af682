use anyhow::{Context, Result};
use clap::Parser;
use pdf_chat::llm::openai::OpenAiClient;
use pdf_chat::{router, AppState, Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let llm = OpenAiClient::new(config.openai_base_url.clone(), config.upstream_timeout())
        .context("failed to build HTTP client")?;
    tracing::info!(
        variant = ?config.variant,
        model = %config.default_model(),
        "starting server"
    );

    let listener = config
        .bind()
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let app = router(AppState::new(config, Arc::new(llm)));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
