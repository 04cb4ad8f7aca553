// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::analytics_service::AnalyticsService;
use crate::application::ingest_service::IngestService;
use crate::application::sample_repository::SampleRepository;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::memory_store::InMemoryStore;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn SampleRepository> = match &settings.storage.journal_path {
        Some(path) => Arc::new(InMemoryStore::with_journal(path).await?),
        None => {
            tracing::info!("No journal configured, samples are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    // Create services (application layer)
    let ingest_service = IngestService::new(repository.clone());
    let analytics_service = AnalyticsService::new(repository, settings.analytics.clone())?;

    // Create application state
    let state = Arc::new(AppState {
        ingest_service,
        analytics_service,
        max_upload_bytes: settings.upload.max_bytes,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = settings.server.bind_addr.parse()?;
    tracing::info!("Starting health-analytics service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
