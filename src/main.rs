use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use adaptive_rag::api;
use adaptive_rag::config::Config;
use adaptive_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM provider: {} ({})",
        config.llm.provider,
        config.llm.base_url
    );

    let state = AppState::new(config.clone())?;
    tracing::info!(
        "Corpus: {} vector entries",
        state.vectors.entry_count()
    );

    let app = Router::new()
        .route("/health", get(api::health::health))
        .route("/api/ask", post(api::ask::ask))
        .route("/api/documents", post(api::documents::ingest))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
