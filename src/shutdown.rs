//! Graceful shutdown coordination
//!
//! SIGINT or SIGTERM cancels a shared [`CancellationToken`]. The HTTP server
//! stops accepting connections as soon as the token fires and then has
//! `in_flight_timeout` to let active requests finish before it is dropped.
//! A store write already issued when a request is dropped is not rolled back.
//!
//! # Example
//!
//! ```rust,no_run
//! use pet_adoption::shutdown::{ShutdownConfig, ShutdownCoordinator};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let coordinator = ShutdownCoordinator::new(ShutdownConfig::new(Duration::from_secs(30)));
//! let token = coordinator.token();
//!
//! tokio::spawn({
//!     let coordinator = coordinator.clone();
//!     async move { coordinator.wait_for_signal().await }
//! });
//!
//! token.cancelled().await;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight requests once shutdown starts
    pub in_flight_timeout: Duration,
}

impl ShutdownConfig {
    pub fn new(in_flight_timeout: Duration) -> Self {
        Self { in_flight_timeout }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    /// No new connections; waiting for active requests
    Draining,
    Complete,
    /// Drain deadline passed with requests still running
    Forced,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownPhase::Running => write!(f, "running"),
            ShutdownPhase::Draining => write!(f, "draining"),
            ShutdownPhase::Complete => write!(f, "complete"),
            ShutdownPhase::Forced => write!(f, "forced"),
        }
    }
}

#[derive(Clone)]
pub struct ShutdownCoordinator {
    config: ShutdownConfig,
    phase: Arc<RwLock<ShutdownPhase>>,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            config,
            phase: Arc::new(RwLock::new(ShutdownPhase::Running)),
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.read()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Starts shutdown without waiting for a signal.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            self.set_phase(ShutdownPhase::Draining);
            self.token.cancel();
        }
    }

    /// Resolves on SIGINT or SIGTERM (or an earlier [`trigger`](Self::trigger))
    /// and starts shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
            _ = self.token.cancelled() => {}
        }
        self.trigger();
    }

    /// Drives `server` to completion, bounding the drain once shutdown starts.
    ///
    /// `server` is expected to stop accepting connections when the token is
    /// cancelled (e.g. axum's `with_graceful_shutdown`).
    pub async fn run_until_drained<F>(&self, server: F) -> Result<()>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                self.set_phase(ShutdownPhase::Complete);
                return Ok(result?);
            }
            _ = self.token.cancelled() => {}
        }

        match timeout(self.config.in_flight_timeout, &mut server).await {
            Ok(result) => {
                self.set_phase(ShutdownPhase::Complete);
                info!("all in-flight requests finished");
                Ok(result?)
            }
            Err(_) => {
                self.set_phase(ShutdownPhase::Forced);
                warn!(
                    timeout_secs = self.config.in_flight_timeout.as_secs(),
                    "in-flight requests did not finish before the deadline"
                );
                Ok(())
            }
        }
    }

    fn set_phase(&self, phase: ShutdownPhase) {
        *self.phase.write() = phase;
    }
}
