// Main entry point - Dependency injection and server setup
use anyhow::Context;
use dashgrid::application::dashboard_repository::DashboardRepository;
use dashgrid::application::dashboard_service::DashboardService;
use dashgrid::infrastructure::config::{load_app_config, StorageKind};
use dashgrid::infrastructure::json_file_repository::JsonFileRepository;
use dashgrid::infrastructure::memory_repository::InMemoryRepository;
use dashgrid::presentation::{app_state::AppState, router};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn DashboardRepository> = match config.storage.kind {
        StorageKind::File => {
            tracing::info!("Storing dashboards under {}", config.storage.dir);
            Arc::new(JsonFileRepository::new(&config.storage.dir))
        }
        StorageKind::Memory => {
            tracing::info!("Storing dashboards in memory only");
            Arc::new(InMemoryRepository::new())
        }
    };

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        repository,
        config.layout.options(),
        config.layout.viewport_width,
    );

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let app = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting dashgrid service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
