pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod logging;
pub mod mapping;
pub mod metrics;
pub mod model;
pub mod projection;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{CliArgs, ServerConfig, StoreBackend};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use lifecycle::{AdoptionService, LifecycleError};
pub use logging::{LoggingConfig, init_logging, shutdown_telemetry};
pub use routes::build_router;
pub use shutdown::{ShutdownConfig, ShutdownCoordinator};
pub use state::AppState;

use anyhow::{Context, Result};
use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::from_config(config.clone())?);

    match state.repos().health.ping().await {
        Ok(()) => tracing::info!("entity store reachable"),
        Err(error) => tracing::warn!(%error, "entity store not reachable at startup"),
    }

    let coordinator = ShutdownCoordinator::new(ShutdownConfig::new(
        config.graceful_shutdown_timeout,
    ));
    tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.wait_for_signal().await }
    });

    let listener = TcpListener::bind(config.http_bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_bind_address))?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(
        bind = %actual_addr,
        store = %config.store,
        "pet adoption API listening"
    );

    let token = coordinator.token();
    let server = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .into_future();

    coordinator.run_until_drained(server).await?;
    tracing::info!(phase = %coordinator.phase(), "server stopped");
    Ok(())
}
