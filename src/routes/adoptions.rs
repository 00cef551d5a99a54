use super::{created, json_body};
use crate::error::ApiResult;
use crate::model::{AdoptionApplication, ApplicationId, ApplicationWithPet, PetId, UserId};
use crate::state::AppState;
use crate::validation::payloads;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use std::sync::Arc;

/// `POST /api/adoptions`
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Response> {
    let request = payloads::application_create(&json_body(body)?)?;
    let application = state.adoptions().submit(request).await?;
    Ok(created(application))
}

/// A user's applications, each joined with its pet.
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ApplicationWithPet>>> {
    let applications = state
        .adoptions()
        .list_for_user(&UserId::new(user_id))
        .await?;
    Ok(Json(applications))
}

pub async fn list_for_pet(
    State(state): State<Arc<AppState>>,
    Path(pet_id): Path<String>,
) -> ApiResult<Json<Vec<AdoptionApplication>>> {
    let applications = state.adoptions().list_for_pet(&PetId::new(pet_id)).await?;
    Ok(Json(applications))
}

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AdoptionApplication>> {
    Ok(Json(
        state.adoptions().get(&ApplicationId::new(id)).await?,
    ))
}

/// `PUT /api/adoptions/{id}/status`
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<AdoptionApplication>> {
    let update = payloads::status_update(&json_body(body)?)?;
    let application = state
        .adoptions()
        .update_status(&ApplicationId::new(id), update)
        .await?;
    Ok(Json(application))
}
