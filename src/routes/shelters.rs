use super::{created, json_body};
use crate::error::{ApiError, ApiResult};
use crate::model::{Shelter, ShelterId, ShelterWithPets};
use crate::state::AppState;
use crate::validation::payloads;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use std::sync::Arc;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Shelter>>> {
    Ok(Json(state.repos().shelters.list().await?))
}

/// Shelter detail with the pets it owns.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ShelterWithPets>> {
    let id = ShelterId::new(id);
    state
        .repos()
        .shelters
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shelter", &id))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Response> {
    let new_shelter = payloads::shelter_create(&json_body(body)?)?;
    let shelter = state.repos().shelters.create(new_shelter).await?;
    tracing::info!(shelter_id = %shelter.id, "shelter registered");
    Ok(created(shelter))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<Shelter>> {
    let changes = payloads::shelter_update(&json_body(body)?)?;
    let id = ShelterId::new(id);
    let shelters = &state.repos().shelters;
    let updated = if changes.is_empty() {
        shelters.get(&id).await?.map(|detail| detail.shelter)
    } else {
        shelters.update(&id, changes).await?
    };
    updated
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shelter", &id))
}
