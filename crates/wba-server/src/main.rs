use anyhow::Result;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wba_interaction::{CompletionClient, SuggestionFetcher};
use wba_server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // A missing credential is a per-request configuration error, not a
    // startup failure: the rest of the app works without suggestions.
    let fetcher: Option<Arc<dyn SuggestionFetcher>> = match CompletionClient::try_from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "AI provider not configured; suggestions disabled");
            None
        }
    };

    let port: u16 = env::var("WBA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8787);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "wba-server listening");
    axum::serve(listener, router(AppState { fetcher })).await?;

    Ok(())
}
