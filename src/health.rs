use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Health status for a component or the overall system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Liveness body. `status` is always `"ok"` while the process serves HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealthReport {
    pub backend: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    pub store: StoreHealthReport,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        (self.status.status_code(), Json(self)).into_response()
    }
}

#[derive(Clone)]
pub struct HealthChecker {
    state: Arc<AppState>,
}

impl HealthChecker {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn liveness(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: now(),
        }
    }

    /// Ready when one round trip to the entity store succeeds.
    pub async fn readiness(&self) -> ReadinessResponse {
        let health = &self.state.repos().health;
        let started = Instant::now();
        let result = health.ping().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let store = match result {
            Ok(()) => StoreHealthReport {
                backend: health.backend().to_string(),
                status: HealthStatus::Healthy,
                latency_ms,
                error: None,
            },
            Err(err) => {
                tracing::warn!(backend = health.backend(), error = %err, "store not ready");
                StoreHealthReport {
                    backend: health.backend().to_string(),
                    status: HealthStatus::Unhealthy,
                    latency_ms,
                    error: Some(err.message),
                }
            }
        };

        ReadinessResponse {
            ready: store.status == HealthStatus::Healthy,
            status: store.status,
            timestamp: now(),
            store,
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// `GET /health`
pub async fn liveness_handler(State(state): State<Arc<AppState>>) -> HealthResponse {
    HealthChecker::new(state).liveness()
}

/// `GET /ready`
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> ReadinessResponse {
    HealthChecker::new(state).readiness().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_body_reports_ok() {
        let body = serde_json::to_value(HealthResponse {
            status: "ok".to_string(),
            version: "0.0.0".to_string(),
            timestamp: 0,
        })
        .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn unhealthy_maps_to_503() {
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(HealthStatus::Healthy.status_code(), StatusCode::OK);
    }
}
