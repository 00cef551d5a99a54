//! Prometheus metrics for production observability
//!
//! Request counts and latency per route, store round trips, error codes and
//! application status transitions. Exposed as text at `/metrics`.

use crate::error::ErrorCode;
use crate::model::ApplicationStatus;
use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for HTTP request metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    /// Route template, e.g. `/api/pets/{id}`
    pub route: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub method: String,
    pub route: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StoreLabels {
    pub table: String,
    pub operation: String,
    /// "ok" or "error"
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub code: String,
    pub category: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransitionLabels {
    pub from: String,
    pub to: String,
}

/// Central metrics collector with Prometheus registry
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Completed HTTP requests by route and status
    pub http_requests_total: Family<RequestLabels, Counter>,

    pub http_request_duration_seconds: Family<RouteLabels, Histogram>,

    /// Requests currently being processed
    pub http_active_requests: Family<RouteLabels, Gauge>,

    /// Hosted store round trips
    pub store_calls_total: Family<StoreLabels, Counter>,

    pub errors_total: Family<ErrorLabels, Counter>,

    pub application_transitions_total: Family<TransitionLabels, Counter>,
}

impl MetricsCollector {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                // Buckets: 5ms .. ~20s
                Histogram::new(exponential_buckets(0.005, 2.5, 10))
            });
        registry.register(
            "http_request_duration_seconds",
            "Request latency histogram in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_active_requests = Family::<RouteLabels, Gauge>::default();
        registry.register(
            "http_active_requests",
            "Number of requests currently being processed",
            http_active_requests.clone(),
        );

        let store_calls_total = Family::<StoreLabels, Counter>::default();
        registry.register(
            "store_calls",
            "Total number of hosted store calls by table, operation and outcome",
            store_calls_total.clone(),
        );

        let errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "errors",
            "Total number of error responses by code",
            errors_total.clone(),
        );

        let application_transitions_total = Family::<TransitionLabels, Counter>::default();
        registry.register(
            "application_transitions",
            "Adoption application status changes",
            application_transitions_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            http_active_requests,
            store_calls_total,
            errors_total,
            application_transitions_total,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        let registry = self.registry.read();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    pub fn record_request(&self, method: &str, route: &str, status: StatusCode, duration: Duration) {
        self.http_requests_total
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                route: route.to_string(),
                status: status.as_u16().to_string(),
            })
            .inc();

        self.http_request_duration_seconds
            .get_or_create(&RouteLabels {
                method: method.to_string(),
                route: route.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn record_store_call(&self, table: &str, operation: &str, outcome: &str) {
        self.store_calls_total
            .get_or_create(&StoreLabels {
                table: table.to_string(),
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_error(&self, code: ErrorCode) {
        self.errors_total
            .get_or_create(&ErrorLabels {
                code: code.as_str().to_string(),
                category: code.category().to_string(),
            })
            .inc();
    }

    pub fn record_transition(&self, from: ApplicationStatus, to: ApplicationStatus) {
        self.application_transitions_total
            .get_or_create(&TransitionLabels {
                from: from.to_string(),
                to: to.to_string(),
            })
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for request timing
///
/// Keeps the in-flight gauge accurate even when the handler future is
/// dropped before completing (client disconnect).
pub struct RequestMetrics {
    labels: RouteLabels,
    start: Instant,
}

impl RequestMetrics {
    pub fn new(method: &str, route: &str) -> Self {
        let labels = RouteLabels {
            method: method.to_string(),
            route: route.to_string(),
        };
        METRICS.http_active_requests.get_or_create(&labels).inc();
        Self {
            labels,
            start: Instant::now(),
        }
    }

    /// Records the final status; the gauge is released on drop.
    pub fn finish(self, status: StatusCode) {
        METRICS.record_request(
            &self.labels.method,
            &self.labels.route,
            status,
            self.start.elapsed(),
        );
    }
}

impl Drop for RequestMetrics {
    fn drop(&mut self) {
        METRICS.http_active_requests.get_or_create(&self.labels).dec();
    }
}

/// Route-level middleware recording every matched request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());
    let guard = RequestMetrics::new(request.method().as_str(), &route);
    let response = next.run(request).await;
    guard.finish(response.status());
    response
}
