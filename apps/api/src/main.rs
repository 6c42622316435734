use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;
mod state;

use shared_config::AppConfig;
use shared_utils::SystemClock;

use crate::state::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediBook API server");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("STORAGE_BACKEND=redis requires REDIS_URL");
    }

    let store = shared_database::connect(&config)
        .await
        .context("Failed to open scheduling store")?;
    let services = Arc::new(AppServices::new(config, store, Arc::new(SystemClock)));

    let report = services.prepare_catalog().await?;
    info!(
        "Catalog ready: {} doctors, {} new slots over {} days",
        report.doctors, report.slots_inserted, report.days
    );

    // Background tasks
    let sweeper = services.sweeper.clone();
    let sweeper_handle = tokio::spawn(async move { sweeper.start().await });
    tokio::spawn(services.clone().rematerialize_daily());

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(&services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], services.config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    services.sweeper.shutdown().await;
    match sweeper_handle.await {
        Ok(Err(e)) => error!("Expiry sweeper exited with error: {}", e),
        Err(e) => error!("Expiry sweeper task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("MediBook API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
