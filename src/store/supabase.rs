//! PostgREST client for a hosted Supabase project.
//!
//! Tables: `pets`, `shelters`, `adoption_applications`, `profiles`. Every
//! method is a single HTTP round trip; writes ask for the affected rows back
//! with `Prefer: return=representation`.

use super::{
    ApplicationStore, PetStore, ProfileStore, ShelterStore, StoreError, StoreHealth, StoreResult,
};
use crate::mapping::{
    ApplicationInsertRow, ApplicationRow, ApplicationStatusRow, PetInsertRow, PetRow,
    PetUpdateRow, ProfileFavoritesRow, ProfileRow, ProfileUpsertRow, ShelterInsertRow, ShelterRow,
    ShelterUpdateRow,
};
use crate::metrics::METRICS;
use crate::model::{
    AdoptionApplication, ApplicationId, ApplicationStatus, ApplicationWithPet, NewApplication,
    NewPet, NewShelter, Pet, PetChanges, PetFilter, PetId, PetStatus, Profile, ProfileChanges,
    Shelter, ShelterChanges, ShelterId, ShelterWithPets, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const PETS: &str = "pets";
const SHELTERS: &str = "shelters";
const APPLICATIONS: &str = "adoption_applications";
const PROFILES: &str = "profiles";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SupabaseStore {
    rest_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            api_key: config.api_key,
            client,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &'static str,
        columns: &str,
        filters: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", columns.to_string())];
        query.extend(filters.iter().map(|(col, val)| (*col, format!("eq.{val}"))));
        let response = self.request(Method::GET, table).query(&query).send().await;
        rows(table, "select", response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &'static str,
        columns: &str,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let mut found = self
            .select(table, columns, &[("id", id.to_string())])
            .await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        body: &B,
    ) -> StoreResult<T> {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[body])
            .send()
            .await;
        let mut inserted: Vec<T> = rows(table, "insert", response).await?;
        if inserted.is_empty() {
            return Err(StoreError::new(format!("insert into {table} returned no row")));
        }
        Ok(inserted.swap_remove(0))
    }

    async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: &str,
        body: &B,
    ) -> StoreResult<Option<T>> {
        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))])
            .json(body)
            .send()
            .await;
        let mut updated: Vec<T> = rows(table, "update", response).await?;
        Ok(if updated.is_empty() {
            None
        } else {
            Some(updated.swap_remove(0))
        })
    }
}

/// Decodes a PostgREST array response, recording the call outcome.
async fn rows<T: DeserializeOwned>(
    table: &'static str,
    operation: &'static str,
    response: reqwest::Result<Response>,
) -> StoreResult<Vec<T>> {
    let result = decode(response).await;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    METRICS.record_store_call(table, operation, outcome);
    debug!(table, operation, outcome, "store call");
    result
}

async fn decode<T: DeserializeOwned>(response: reqwest::Result<Response>) -> StoreResult<Vec<T>> {
    let response = response?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::new(error_message(status, &body)));
    }
    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| StoreError::new(format!("failed to decode store response: {e}")))
}

/// PostgREST errors carry a `message` field; fall back to the raw body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("store returned {status}: {body}"))
}

fn pet_filters(filter: &PetFilter) -> Vec<(&'static str, String)> {
    let mut filters = Vec::new();
    if let Some(species) = filter.species {
        filters.push(("species", species.to_string()));
    }
    if let Some(status) = filter.status {
        filters.push(("status", status.to_string()));
    }
    if let Some(age) = filter.age {
        filters.push(("age", age.to_string()));
    }
    if let Some(size) = filter.size {
        filters.push(("size", size.to_string()));
    }
    if let Some(shelter_id) = &filter.shelter_id {
        filters.push(("shelter_id", shelter_id.to_string()));
    }
    filters
}

#[async_trait]
impl PetStore for SupabaseStore {
    async fn create(&self, pet: NewPet) -> StoreResult<Pet> {
        let row: PetRow = self.insert(PETS, &PetInsertRow::from(pet)).await?;
        Ok(row.into())
    }

    async fn get(&self, id: &PetId) -> StoreResult<Option<Pet>> {
        let row: Option<PetRow> = self.select_one(PETS, "*", id.as_str()).await?;
        Ok(row.map(Pet::from))
    }

    async fn list(&self, filter: &PetFilter) -> StoreResult<Vec<Pet>> {
        let rows: Vec<PetRow> = self.select(PETS, "*", &pet_filters(filter)).await?;
        Ok(rows.into_iter().map(Pet::from).collect())
    }

    async fn update(&self, id: &PetId, changes: PetChanges) -> StoreResult<Option<Pet>> {
        let row: Option<PetRow> = self
            .patch(PETS, id.as_str(), &PetUpdateRow::from(changes))
            .await?;
        Ok(row.map(Pet::from))
    }

    async fn set_status(&self, id: &PetId, status: PetStatus) -> StoreResult<Option<Pet>> {
        let row: Option<PetRow> = self
            .patch(PETS, id.as_str(), &PetUpdateRow::status(status))
            .await?;
        Ok(row.map(Pet::from))
    }
}

#[async_trait]
impl ShelterStore for SupabaseStore {
    async fn create(&self, shelter: NewShelter) -> StoreResult<Shelter> {
        let row: ShelterRow = self
            .insert(SHELTERS, &ShelterInsertRow::from(shelter))
            .await?;
        Ok(row.into())
    }

    async fn get(&self, id: &ShelterId) -> StoreResult<Option<ShelterWithPets>> {
        let row: Option<ShelterRow> = self.select_one(SHELTERS, "*,pets(*)", id.as_str()).await?;
        Ok(row.map(ShelterWithPets::from))
    }

    async fn list(&self) -> StoreResult<Vec<Shelter>> {
        let rows: Vec<ShelterRow> = self.select(SHELTERS, "*", &[]).await?;
        Ok(rows.into_iter().map(Shelter::from).collect())
    }

    async fn update(
        &self,
        id: &ShelterId,
        changes: ShelterChanges,
    ) -> StoreResult<Option<Shelter>> {
        let row: Option<ShelterRow> = self
            .patch(SHELTERS, id.as_str(), &ShelterUpdateRow::from(changes))
            .await?;
        Ok(row.map(Shelter::from))
    }
}

#[async_trait]
impl ApplicationStore for SupabaseStore {
    async fn create(&self, application: NewApplication) -> StoreResult<AdoptionApplication> {
        let row: ApplicationRow = self
            .insert(
                APPLICATIONS,
                &ApplicationInsertRow::new(application, Utc::now()),
            )
            .await?;
        Ok(row.into())
    }

    async fn get(&self, id: &ApplicationId) -> StoreResult<Option<AdoptionApplication>> {
        let row: Option<ApplicationRow> = self.select_one(APPLICATIONS, "*", id.as_str()).await?;
        Ok(row.map(AdoptionApplication::from))
    }

    async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<ApplicationWithPet>> {
        let rows: Vec<ApplicationRow> = self
            .select(APPLICATIONS, "*,pets(*)", &[("user_id", user_id.to_string())])
            .await?;
        Ok(rows.into_iter().map(ApplicationWithPet::from).collect())
    }

    async fn list_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<AdoptionApplication>> {
        let rows: Vec<ApplicationRow> = self
            .select(APPLICATIONS, "*", &[("pet_id", pet_id.to_string())])
            .await?;
        Ok(rows.into_iter().map(AdoptionApplication::from).collect())
    }

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> StoreResult<Option<AdoptionApplication>> {
        let row: Option<ApplicationRow> = self
            .patch(
                APPLICATIONS,
                id.as_str(),
                &ApplicationStatusRow { status, notes },
            )
            .await?;
        Ok(row.map(AdoptionApplication::from))
    }
}

#[async_trait]
impl ProfileStore for SupabaseStore {
    async fn get(&self, id: &UserId) -> StoreResult<Option<Profile>> {
        let row: Option<ProfileRow> = self.select_one(PROFILES, "*", id.as_str()).await?;
        Ok(row.map(Profile::from))
    }

    async fn upsert(&self, id: &UserId, changes: ProfileChanges) -> StoreResult<Profile> {
        let response = self
            .request(Method::POST, PROFILES)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[ProfileUpsertRow::new(id, changes)])
            .send()
            .await;
        let mut upserted: Vec<ProfileRow> = rows(PROFILES, "upsert", response).await?;
        if upserted.is_empty() {
            return Err(StoreError::new("upsert into profiles returned no row"));
        }
        Ok(upserted.swap_remove(0).into())
    }

    async fn set_favorites(
        &self,
        id: &UserId,
        favorites: Vec<PetId>,
    ) -> StoreResult<Option<Profile>> {
        let body = ProfileFavoritesRow {
            favorites: favorites.into_iter().map(PetId::into_inner).collect(),
        };
        let row: Option<ProfileRow> = self.patch(PROFILES, id.as_str(), &body).await?;
        Ok(row.map(Profile::from))
    }
}

#[async_trait]
impl StoreHealth for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn ping(&self) -> StoreResult<()> {
        let response = self
            .request(Method::GET, PETS)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await;
        let _: Vec<serde_json::Value> = rows(PETS, "ping", response).await?;
        Ok(())
    }
}
