//! In-process store used for local development and tests.

use super::{
    ApplicationStore, PetStore, ProfileStore, ShelterStore, StoreError, StoreHealth, StoreResult,
};
use crate::model::{
    AdoptionApplication, ApplicationId, ApplicationStatus, ApplicationWithPet, Contact,
    NewApplication, NewPet, NewShelter, Pet, PetChanges, PetFilter, PetId, PetStatus, Profile,
    ProfileChanges, Shelter, ShelterChanges, ShelterId, ShelterWithPets, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Tables keyed by id, iterated in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    pets: RwLock<IndexMap<PetId, Pet>>,
    shelters: RwLock<IndexMap<ShelterId, Shelter>>,
    applications: RwLock<IndexMap<ApplicationId, AdoptionApplication>>,
    profiles: RwLock<IndexMap<UserId, Profile>>,
    /// When set, every call fails with a store error.
    unavailable: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail, simulating an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::new("store unavailable"))
        } else {
            Ok(())
        }
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn next_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl PetStore for MemoryStore {
    async fn create(&self, pet: NewPet) -> StoreResult<Pet> {
        self.check()?;
        let record = Pet {
            id: PetId::new(Self::next_id()),
            name: pet.name,
            species: pet.species,
            breed: pet.breed,
            age: pet.age,
            age_months: pet.age_months,
            size: pet.size,
            color: pet.color,
            description: pet.description,
            medical_history: pet.medical_history,
            images: pet.images,
            status: PetStatus::Available,
            shelter_id: pet.shelter_id,
            created_at: Some(Utc::now()),
        };
        self.pets.write().insert(record.id.clone(), record.clone());
        self.wrote();
        Ok(record)
    }

    async fn get(&self, id: &PetId) -> StoreResult<Option<Pet>> {
        self.check()?;
        Ok(self.pets.read().get(id).cloned())
    }

    async fn list(&self, filter: &PetFilter) -> StoreResult<Vec<Pet>> {
        self.check()?;
        Ok(self
            .pets
            .read()
            .values()
            .filter(|pet| filter.matches(pet))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &PetId, changes: PetChanges) -> StoreResult<Option<Pet>> {
        self.check()?;
        let mut pets = self.pets.write();
        let Some(pet) = pets.get_mut(id) else {
            return Ok(None);
        };
        changes.apply(pet);
        let updated = pet.clone();
        drop(pets);
        self.wrote();
        Ok(Some(updated))
    }

    async fn set_status(&self, id: &PetId, status: PetStatus) -> StoreResult<Option<Pet>> {
        self.check()?;
        let mut pets = self.pets.write();
        let Some(pet) = pets.get_mut(id) else {
            return Ok(None);
        };
        pet.status = status;
        let updated = pet.clone();
        drop(pets);
        self.wrote();
        Ok(Some(updated))
    }
}

#[async_trait]
impl ShelterStore for MemoryStore {
    async fn create(&self, shelter: NewShelter) -> StoreResult<Shelter> {
        self.check()?;
        let record = Shelter {
            id: ShelterId::new(Self::next_id()),
            name: shelter.name,
            location: shelter.location,
            contact: Contact {
                email: shelter.email,
                phone: shelter.phone,
            },
            description: shelter.description,
            rating: shelter.rating,
            created_at: Some(Utc::now()),
        };
        self.shelters
            .write()
            .insert(record.id.clone(), record.clone());
        self.wrote();
        Ok(record)
    }

    async fn get(&self, id: &ShelterId) -> StoreResult<Option<ShelterWithPets>> {
        self.check()?;
        let Some(shelter) = self.shelters.read().get(id).cloned() else {
            return Ok(None);
        };
        let pets = self
            .pets
            .read()
            .values()
            .filter(|pet| pet.shelter_id.as_ref() == Some(id))
            .cloned()
            .collect();
        Ok(Some(ShelterWithPets { shelter, pets }))
    }

    async fn list(&self) -> StoreResult<Vec<Shelter>> {
        self.check()?;
        Ok(self.shelters.read().values().cloned().collect())
    }

    async fn update(
        &self,
        id: &ShelterId,
        changes: ShelterChanges,
    ) -> StoreResult<Option<Shelter>> {
        self.check()?;
        let mut shelters = self.shelters.write();
        let Some(shelter) = shelters.get_mut(id) else {
            return Ok(None);
        };
        changes.apply(shelter);
        let updated = shelter.clone();
        drop(shelters);
        self.wrote();
        Ok(Some(updated))
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(&self, application: NewApplication) -> StoreResult<AdoptionApplication> {
        self.check()?;
        let record = AdoptionApplication {
            id: ApplicationId::new(Self::next_id()),
            pet_id: application.pet_id,
            user_id: application.user_id,
            status: ApplicationStatus::Pending,
            notes: application.notes,
            submitted_at: Utc::now(),
        };
        self.applications
            .write()
            .insert(record.id.clone(), record.clone());
        self.wrote();
        Ok(record)
    }

    async fn get(&self, id: &ApplicationId) -> StoreResult<Option<AdoptionApplication>> {
        self.check()?;
        Ok(self.applications.read().get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<ApplicationWithPet>> {
        self.check()?;
        let applications = self.applications.read();
        let pets = self.pets.read();
        Ok(applications
            .values()
            .filter(|app| &app.user_id == user_id)
            .map(|app| ApplicationWithPet {
                application: app.clone(),
                pet: pets.get(&app.pet_id).cloned(),
            })
            .collect())
    }

    async fn list_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<AdoptionApplication>> {
        self.check()?;
        Ok(self
            .applications
            .read()
            .values()
            .filter(|app| &app.pet_id == pet_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> StoreResult<Option<AdoptionApplication>> {
        self.check()?;
        let mut applications = self.applications.write();
        let Some(app) = applications.get_mut(id) else {
            return Ok(None);
        };
        app.status = status;
        if notes.is_some() {
            app.notes = notes;
        }
        let updated = app.clone();
        drop(applications);
        self.wrote();
        Ok(Some(updated))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, id: &UserId) -> StoreResult<Option<Profile>> {
        self.check()?;
        Ok(self.profiles.read().get(id).cloned())
    }

    async fn upsert(&self, id: &UserId, changes: ProfileChanges) -> StoreResult<Profile> {
        self.check()?;
        let mut profiles = self.profiles.write();
        let profile = profiles
            .entry(id.clone())
            .or_insert_with(|| Profile::new(id.clone()));
        changes.apply(profile);
        let updated = profile.clone();
        drop(profiles);
        self.wrote();
        Ok(updated)
    }

    async fn set_favorites(
        &self,
        id: &UserId,
        favorites: Vec<PetId>,
    ) -> StoreResult<Option<Profile>> {
        self.check()?;
        let mut profiles = self.profiles.write();
        let Some(profile) = profiles.get_mut(id) else {
            return Ok(None);
        };
        profile.favorites = favorites;
        let updated = profile.clone();
        drop(profiles);
        self.wrote();
        Ok(Some(updated))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PetSize, Species};

    fn new_pet(name: &str) -> NewPet {
        NewPet {
            name: name.to_string(),
            species: Species::Cat,
            breed: "Tabby".to_string(),
            age: 1,
            age_months: None,
            size: PetSize::Small,
            color: None,
            description: "curious".to_string(),
            medical_history: None,
            images: Vec::new(),
            shelter_id: None,
        }
    }

    #[tokio::test]
    async fn created_pet_defaults_to_available() {
        let store = MemoryStore::new();
        let pet = PetStore::create(&store, new_pet("Luna")).await.unwrap();
        assert_eq!(pet.status, PetStatus::Available);
        let fetched = PetStore::get(&store, &pet.id).await.unwrap().unwrap();
        assert_eq!(fetched, pet);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            PetStore::create(&store, new_pet(name)).await.unwrap();
        }
        let names: Vec<_> = PetStore::list(&store, &PetFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn update_missing_row_returns_none() {
        let store = MemoryStore::new();
        let result = PetStore::update(&store, &PetId::new("nope"), PetChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let err = PetStore::list(&store, &PetFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "store unavailable");
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn shelter_detail_includes_owned_pets() {
        let store = MemoryStore::new();
        let shelter = ShelterStore::create(
            &store,
            NewShelter {
                name: "Tails".to_string(),
                location: "Portland".to_string(),
                email: "a@b.org".to_string(),
                phone: "555".to_string(),
                description: "d".to_string(),
                rating: None,
            },
        )
        .await
        .unwrap();
        let mut owned = new_pet("owned");
        owned.shelter_id = Some(shelter.id.clone());
        PetStore::create(&store, owned).await.unwrap();
        PetStore::create(&store, new_pet("stray")).await.unwrap();

        let detail = ShelterStore::get(&store, &shelter.id).await.unwrap().unwrap();
        assert_eq!(detail.pets.len(), 1);
        assert_eq!(detail.pets[0].name, "owned");
    }
}
