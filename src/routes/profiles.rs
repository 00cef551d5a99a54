use super::json_body;
use crate::error::{ApiError, ApiResult};
use crate::model::{PetId, Profile, UserId};
use crate::state::AppState;
use crate::validation::{ValidationError, payloads};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use std::sync::Arc;

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Profile>> {
    let id = UserId::new(id);
    state
        .repos()
        .profiles
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile", &id))
}

/// Creates the profile on first write. A shelter role needs a shelter name,
/// checked against the merged result before anything is written.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let changes = payloads::profile_update(&json_body(body)?)?;
    let id = UserId::new(id);
    let profiles = &state.repos().profiles;

    let mut merged = profiles
        .get(&id)
        .await?
        .unwrap_or_else(|| Profile::new(id.clone()));
    changes.apply(&mut merged);
    payloads::check_profile(&merged)?;

    let profile = profiles.upsert(&id, changes).await?;
    Ok(Json(profile))
}

/// `POST /api/profiles/{id}/favorites` with `{ "petId": .. }`
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let request = payloads::favorite(&json_body(body)?)?;
    let id = UserId::new(id);
    let repos = state.repos();

    if repos.pets.get(&request.pet_id).await?.is_none() {
        return Err(ValidationError::single("petId", "does not reference an existing pet").into());
    }
    let mut profile = repos
        .profiles
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile", &id))?;

    if !profile.add_favorite(request.pet_id) {
        return Ok(Json(profile));
    }
    repos
        .profiles
        .set_favorites(&id, profile.favorites)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile", &id))
}

/// `DELETE /api/profiles/{id}/favorites/{pet_id}`; removing an absent
/// favorite is not an error.
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path((id, pet_id)): Path<(String, String)>,
) -> ApiResult<Json<Profile>> {
    let id = UserId::new(id);
    let profiles = &state.repos().profiles;
    let mut profile = profiles
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile", &id))?;

    if !profile.remove_favorite(&PetId::new(pet_id)) {
        return Ok(Json(profile));
    }
    profiles
        .set_favorites(&id, profile.favorites)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile", &id))
}
