use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tailor_client::{
    HtmdCleaner, HttpJobScraper, PdfTextExtractor, ProviderClientFactory, ReqwestFetcher,
};
use tailor_core::Orchestrator;
use tailor_server::config::ServerConfig;
use tailor_server::routes;
use tailor_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tailor_server=info".parse()?)
                .add_directive("tailor_core=info".parse()?)
                .add_directive("tailor_client=info".parse()?),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr();

    // Job URLs come from remote users, so private hosts stay blocked.
    let scraper = HttpJobScraper::new(ReqwestFetcher::new()?, HtmdCleaner::new());
    let orchestrator = Orchestrator::new(
        PdfTextExtractor::new(),
        scraper,
        ProviderClientFactory::new(),
    );

    let state = Arc::new(AppState::new(Arc::new(orchestrator), config));

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
