//! Row shapes of the hosted store and their mapping to domain entities.
//!
//! The store uses snake_case columns, flat contact fields and embedded
//! foreign objects (`pets(*)`). Insert and update rows are built from
//! validated payloads only, so nothing outside the field tables reaches
//! storage.

use crate::model::{
    AdoptionApplication, ApplicationId, ApplicationStatus, ApplicationWithPet, Contact, NewApplication,
    NewPet, NewShelter, Pet, PetChanges, PetId, PetSize, PetStatus, Profile, ProfileChanges,
    Shelter, ShelterChanges, ShelterId, ShelterWithPets, Species, UserId, UserRole,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row ids may be uuids or bigint keys.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

// ============================================================================
// Pets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PetRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub age: u32,
    #[serde(default)]
    pub age_months: Option<u8>,
    pub size: PetSize,
    #[serde(default)]
    pub color: Option<String>,
    pub description: String,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub shelter_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PetRow> for Pet {
    fn from(row: PetRow) -> Self {
        Pet {
            id: PetId::new(row.id),
            name: row.name,
            species: row.species,
            breed: row.breed,
            age: row.age,
            age_months: row.age_months,
            size: row.size,
            color: row.color,
            description: row.description,
            medical_history: row.medical_history,
            images: row.images.unwrap_or_default(),
            status: row.status.unwrap_or_default(),
            shelter_id: row.shelter_id.map(ShelterId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetInsertRow {
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_months: Option<u8>,
    pub size: PetSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    pub images: Vec<String>,
    pub status: PetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelter_id: Option<String>,
}

impl From<NewPet> for PetInsertRow {
    fn from(pet: NewPet) -> Self {
        PetInsertRow {
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
            shelter_id: pet.shelter_id.map(ShelterId::into_inner),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PetUpdateRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<Species>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_months: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<PetSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl From<PetChanges> for PetUpdateRow {
    fn from(changes: PetChanges) -> Self {
        PetUpdateRow {
            name: changes.name,
            species: changes.species,
            breed: changes.breed,
            age: changes.age,
            age_months: changes.age_months,
            size: changes.size,
            color: changes.color,
            description: changes.description,
            medical_history: changes.medical_history,
            images: changes.images,
            shelter_id: changes.shelter_id.map(ShelterId::into_inner),
            status: None,
        }
    }
}

impl PetUpdateRow {
    pub fn status(status: PetStatus) -> Self {
        PetUpdateRow {
            status: Some(status),
            ..Default::default()
        }
    }
}

// ============================================================================
// Shelters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShelterRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Present only when the select embeds `pets(*)`.
    #[serde(default)]
    pub pets: Option<Vec<PetRow>>,
}

impl ShelterRow {
    fn split(self) -> (Shelter, Vec<Pet>) {
        let pets = self
            .pets
            .unwrap_or_default()
            .into_iter()
            .map(Pet::from)
            .collect();
        let shelter = Shelter {
            id: ShelterId::new(self.id),
            name: self.name,
            location: self.location,
            contact: Contact {
                email: self.email,
                phone: self.phone,
            },
            description: self.description,
            rating: self.rating,
            created_at: self.created_at,
        };
        (shelter, pets)
    }
}

impl From<ShelterRow> for Shelter {
    fn from(row: ShelterRow) -> Self {
        row.split().0
    }
}

impl From<ShelterRow> for ShelterWithPets {
    fn from(row: ShelterRow) -> Self {
        let (shelter, pets) = row.split();
        ShelterWithPets { shelter, pets }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShelterInsertRow {
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl From<NewShelter> for ShelterInsertRow {
    fn from(shelter: NewShelter) -> Self {
        ShelterInsertRow {
            name: shelter.name,
            location: shelter.location,
            email: shelter.email,
            phone: shelter.phone,
            description: shelter.description,
            rating: shelter.rating,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShelterUpdateRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl From<ShelterChanges> for ShelterUpdateRow {
    fn from(changes: ShelterChanges) -> Self {
        ShelterUpdateRow {
            name: changes.name,
            location: changes.location,
            email: changes.email,
            phone: changes.phone,
            description: changes.description,
            rating: changes.rating,
        }
    }
}

// ============================================================================
// Adoption applications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub pet_id: String,
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Present only when the select embeds `pets(*)`.
    #[serde(default)]
    pub pets: Option<PetRow>,
}

impl ApplicationRow {
    fn split(self) -> (AdoptionApplication, Option<Pet>) {
        let pet = self.pets.map(Pet::from);
        let application = AdoptionApplication {
            id: ApplicationId::new(self.id),
            pet_id: PetId::new(self.pet_id),
            user_id: UserId::new(self.user_id),
            status: self.status,
            notes: self.notes,
            submitted_at: self.submitted_at,
        };
        (application, pet)
    }
}

impl From<ApplicationRow> for AdoptionApplication {
    fn from(row: ApplicationRow) -> Self {
        row.split().0
    }
}

impl From<ApplicationRow> for ApplicationWithPet {
    fn from(row: ApplicationRow) -> Self {
        let (application, pet) = row.split();
        ApplicationWithPet { application, pet }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationInsertRow {
    pub pet_id: String,
    pub user_id: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ApplicationInsertRow {
    /// New applications always start pending, stamped with `submitted_at`.
    pub fn new(application: NewApplication, submitted_at: DateTime<Utc>) -> Self {
        ApplicationInsertRow {
            pet_id: application.pet_id.into_inner(),
            user_id: application.user_id.into_inner(),
            status: ApplicationStatus::Pending,
            notes: application.notes,
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStatusRow {
    pub status: ApplicationStatus,
    /// Omitted notes leave the stored notes untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_shelter: Option<bool>,
    #[serde(default)]
    pub shelter_name: Option<String>,
    #[serde(default)]
    pub favorites: Option<Vec<String>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        // Older rows only carry the `is_shelter` flag.
        let role = row.role.unwrap_or(if row.is_shelter.unwrap_or(false) {
            UserRole::Shelter
        } else {
            UserRole::Adopter
        });
        Profile {
            id: UserId::new(row.id),
            email: row.email,
            display_name: row.display_name,
            role,
            shelter_name: row.shelter_name,
            favorites: row
                .favorites
                .unwrap_or_default()
                .into_iter()
                .map(PetId::new)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpsertRow {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shelter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelter_name: Option<String>,
}

impl ProfileUpsertRow {
    pub fn new(id: &UserId, changes: ProfileChanges) -> Self {
        ProfileUpsertRow {
            id: id.to_string(),
            email: changes.email,
            display_name: changes.display_name,
            is_shelter: changes.role.map(|role| role == UserRole::Shelter),
            role: changes.role,
            shelter_name: changes.shelter_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileFavoritesRow {
    pub favorites: Vec<String>,
}
