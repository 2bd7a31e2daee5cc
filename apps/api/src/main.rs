//! Appdeck preview API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod state;

use appdeck_core::AppError;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::build_app_state;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let app_state = build_app_state(&config)?;
    let app = build_router(app_state.clone(), &config.frontend_url)?;

    let flush_loop = spawn_save_flush_loop(app_state.clone(), &config);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "appdeck-api listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    flush_loop.abort();
    let flushed = app_state.app_instance_service.flush_all_saves().await;
    info!(flushed, "flushed pending saves on shutdown");

    served
}

fn spawn_save_flush_loop(app_state: AppState, config: &ApiConfig) -> tokio::task::JoinHandle<()> {
    let mut interval = tokio::time::interval(config.save_flush_interval);
    tokio::spawn(async move {
        loop {
            interval.tick().await;
            app_state.app_instance_service.flush_due_saves().await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
