//! HTTP surface.
//!
//! Handlers stay thin: validate the payload, call a repository or the
//! adoption service, map the outcome. Every failure goes through
//! [`ApiError`](crate::error::ApiError) so bodies share one shape.

pub mod adoptions;
pub mod pets;
pub mod profiles;
pub mod shelters;

use crate::error::{ApiError, ApiResult};
use crate::health;
use crate::logging::request_span;
use crate::metrics::{self, METRICS};
use crate::state::AppState;
use crate::validation::ValidationError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the full router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/pets", get(pets::list).post(pets::create))
        .route("/api/pets/{id}", get(pets::fetch).put(pets::update))
        .route("/api/pets/{id}/availability", get(pets::availability))
        .route("/api/shelters", get(shelters::list).post(shelters::create))
        .route("/api/shelters/{id}", get(shelters::fetch).put(shelters::update))
        .route("/api/adoptions", post(adoptions::submit))
        .route("/api/adoptions/user/{user_id}", get(adoptions::list_for_user))
        .route("/api/adoptions/pet/{pet_id}", get(adoptions::list_for_pet))
        .route("/api/adoptions/{id}", get(adoptions::fetch))
        .route("/api/adoptions/{id}/status", put(adoptions::update_status))
        .route("/api/profiles/{id}", get(profiles::fetch).put(profiles::update))
        .route("/api/profiles/{id}/favorites", post(profiles::add_favorite))
        .route(
            "/api/profiles/{id}/favorites/{pet_id}",
            axum::routing::delete(profiles::remove_favorite),
        )
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(metrics::track_requests));

    let cors = cors_layer(&state.config().cors_allowed_origins);

    api.fallback(fallback)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.is_empty() || allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

async fn metrics_handler() -> Response {
    match METRICS.encode() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route", "")
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method.to_string())
}

/// Unwraps a JSON body, turning extractor rejections into a 400.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::malformed_body(rejection.body_text()))
}

pub(crate) fn query_params(
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<HashMap<String, String>> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ValidationError::single("query", rejection.body_text()).into())
}

/// `201 Created` with a JSON body.
pub(crate) fn created<T: serde::Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}
