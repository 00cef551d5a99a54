//! Repository interfaces over the hosted entity store.
//!
//! Handlers never talk to a shared client. Each entity collection has its own
//! trait, and [`AppState`](crate::state::AppState) carries one trait object per
//! collection so tests and alternative backends can be swapped in.
//!
//! Update operations return `Ok(None)` when no row matched the identifier.

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

use crate::model::{
    AdoptionApplication, ApplicationId, ApplicationStatus, ApplicationWithPet, NewApplication,
    NewPet, NewShelter, Pet, PetChanges, PetFilter, PetId, PetStatus, Profile, ProfileChanges,
    Shelter, ShelterChanges, ShelterId, ShelterWithPets, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure of the external store, carried verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::new(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PetStore: Send + Sync {
    /// Inserts a new listing with status `available`.
    async fn create(&self, pet: NewPet) -> StoreResult<Pet>;
    async fn get(&self, id: &PetId) -> StoreResult<Option<Pet>>;
    async fn list(&self, filter: &PetFilter) -> StoreResult<Vec<Pet>>;
    async fn update(&self, id: &PetId, changes: PetChanges) -> StoreResult<Option<Pet>>;
    /// Only the adoption lifecycle calls this.
    async fn set_status(&self, id: &PetId, status: PetStatus) -> StoreResult<Option<Pet>>;
}

#[async_trait]
pub trait ShelterStore: Send + Sync {
    async fn create(&self, shelter: NewShelter) -> StoreResult<Shelter>;
    /// Fetches a shelter together with the pets it owns.
    async fn get(&self, id: &ShelterId) -> StoreResult<Option<ShelterWithPets>>;
    async fn list(&self) -> StoreResult<Vec<Shelter>>;
    async fn update(&self, id: &ShelterId, changes: ShelterChanges)
    -> StoreResult<Option<Shelter>>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, application: NewApplication) -> StoreResult<AdoptionApplication>;
    async fn get(&self, id: &ApplicationId) -> StoreResult<Option<AdoptionApplication>>;
    async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<ApplicationWithPet>>;
    async fn list_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<AdoptionApplication>>;
    /// Overwrites the status, and the notes when `notes` is `Some`;
    /// `pet_id`, `user_id` and `submitted_at` never change.
    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> StoreResult<Option<AdoptionApplication>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: &UserId) -> StoreResult<Option<Profile>>;
    /// Applies `changes` to the profile, creating it when absent.
    async fn upsert(&self, id: &UserId, changes: ProfileChanges) -> StoreResult<Profile>;
    async fn set_favorites(&self, id: &UserId, favorites: Vec<PetId>)
    -> StoreResult<Option<Profile>>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Backend name for health reports.
    fn backend(&self) -> &'static str;
    /// Round trip to the store.
    async fn ping(&self) -> StoreResult<()>;
}

/// One handle per collection, cloned into each request's state.
#[derive(Clone)]
pub struct Repositories {
    pub pets: Arc<dyn PetStore>,
    pub shelters: Arc<dyn ShelterStore>,
    pub applications: Arc<dyn ApplicationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Builds the repository set from one backend implementing every trait.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: PetStore + ShelterStore + ApplicationStore + ProfileStore + StoreHealth + 'static,
    {
        Self {
            pets: backend.clone(),
            shelters: backend.clone(),
            applications: backend.clone(),
            profiles: backend.clone(),
            health: backend,
        }
    }
}
