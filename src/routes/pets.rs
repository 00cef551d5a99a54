use super::{created, json_body, query_params};
use crate::error::{ApiError, ApiResult};
use crate::model::{Pet, PetId};
use crate::projection::Availability;
use crate::state::AppState;
use crate::validation::payloads;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use std::collections::HashMap;
use std::sync::Arc;

/// `GET /api/pets?species=&status=&age=&size=&shelterId=`
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Json<Vec<Pet>>> {
    let filter = payloads::pet_filter(&query_params(query)?)?;
    let pets = state.repos().pets.list(&filter).await?;
    Ok(Json(pets))
}

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Pet>> {
    let id = PetId::new(id);
    state
        .repos()
        .pets
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Pet", &id))
}

/// New listings always start `available`; a client-supplied status is dropped.
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Response> {
    let new_pet = payloads::pet_create(&json_body(body)?)?;
    let pet = state.repos().pets.create(new_pet).await?;
    tracing::info!(pet_id = %pet.id, species = %pet.species, "pet listed");
    Ok(created(pet))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<Pet>> {
    let changes = payloads::pet_update(&json_body(body)?)?;
    let id = PetId::new(id);
    let pets = &state.repos().pets;
    let updated = if changes.is_empty() {
        pets.get(&id).await?
    } else {
        pets.update(&id, changes).await?
    };
    updated
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Pet", &id))
}

/// `GET /api/pets/{id}/availability`
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Availability>> {
    let view = state.adoptions().availability(&PetId::new(id)).await?;
    Ok(Json(view))
}
