#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use pet_adoption::store::{MemoryStore, Repositories};
use pet_adoption::{AppState, ServerConfig, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Router over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            Arc::new(config),
            Repositories::from_backend(store.clone()),
        );
        Self {
            router: build_router(Arc::new(state)),
            store,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Creates a pet and returns its id.
    pub async fn create_pet(&self, body: Value) -> String {
        let (status, pet) = self.post("/api/pets", body).await;
        assert_eq!(status, StatusCode::CREATED, "create pet: {pet}");
        pet["id"].as_str().expect("pet id").to_string()
    }

    pub async fn create_application(&self, pet_id: &str, user_id: &str) -> String {
        let (status, app) = self
            .post("/api/adoptions", json!({ "petId": pet_id, "userId": user_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "submit application: {app}");
        app["id"].as_str().expect("application id").to_string()
    }
}

pub fn max_the_lab() -> Value {
    json!({
        "name": "Max",
        "species": "dog",
        "breed": "Lab",
        "age": 2,
        "size": "medium",
        "description": "friendly"
    })
}

pub fn luna_the_cat() -> Value {
    json!({
        "name": "Luna",
        "species": "cat",
        "breed": "Tabby",
        "age": 1,
        "size": "small",
        "description": "curious"
    })
}

pub fn happy_tails() -> Value {
    json!({
        "name": "Happy Tails",
        "location": "Portland, OR",
        "email": "hello@happytails.org",
        "phone": "555-0100",
        "description": "No-kill shelter"
    })
}

/// Field names listed in a validation error body.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
