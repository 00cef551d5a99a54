//! Domain entities and request payload shapes.
//!
//! Entities serialize in the camelCase wire shape the UI consumes. Row shapes
//! used by the hosted store live in [`crate::mapping`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a pet listing.
    PetId
);
string_id!(
    /// Identifier of a shelter.
    ShelterId
);
string_id!(
    /// Identity issued by the auth provider; also keys the profile record.
    UserId
);
string_id!(
    /// Identifier of an adoption application.
    ApplicationId
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Species {
    Dog,
    Cat,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

/// Listing status of a pet. Only the adoption lifecycle moves it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PetStatus {
    #[default]
    Available,
    Pending,
    Adopted,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    #[default]
    Adopter,
    Shelter,
    Foster,
}

// ============================================================================
// Pets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub species: Species,
    pub breed: String,
    /// Age in whole years.
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_months: Option<u8>,
    pub size: PetSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: PetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelter_id: Option<ShelterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated pet creation payload. Carries no status: new listings start
/// as [`PetStatus::Available`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
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
    pub images: Vec<String>,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

/// Validated partial pet update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<Species>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub age_months: Option<u8>,
    #[serde(default)]
    pub size: Option<PetSize>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

impl PetChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, pet: &mut Pet) {
        if let Some(name) = &self.name {
            pet.name = name.clone();
        }
        if let Some(species) = self.species {
            pet.species = species;
        }
        if let Some(breed) = &self.breed {
            pet.breed = breed.clone();
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if self.age_months.is_some() {
            pet.age_months = self.age_months;
        }
        if let Some(size) = self.size {
            pet.size = size;
        }
        if self.color.is_some() {
            pet.color = self.color.clone();
        }
        if let Some(description) = &self.description {
            pet.description = description.clone();
        }
        if self.medical_history.is_some() {
            pet.medical_history = self.medical_history.clone();
        }
        if let Some(images) = &self.images {
            pet.images = images.clone();
        }
        if self.shelter_id.is_some() {
            pet.shelter_id = self.shelter_id.clone();
        }
    }
}

/// Equality filters accepted by the pet listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetFilter {
    #[serde(default)]
    pub species: Option<Species>,
    #[serde(default)]
    pub status: Option<PetStatus>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub size: Option<PetSize>,
    #[serde(default)]
    pub shelter_id: Option<ShelterId>,
}

impl PetFilter {
    pub fn matches(&self, pet: &Pet) -> bool {
        self.species.is_none_or(|species| pet.species == species)
            && self.status.is_none_or(|status| pet.status == status)
            && self.age.is_none_or(|age| pet.age == age)
            && self.size.is_none_or(|size| pet.size == size)
            && self
                .shelter_id
                .as_ref()
                .is_none_or(|shelter| pet.shelter_id.as_ref() == Some(shelter))
    }
}

// ============================================================================
// Shelters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shelter {
    pub id: ShelterId,
    pub name: String,
    pub location: String,
    pub contact: Contact,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterWithPets {
    #[serde(flatten)]
    pub shelter: Shelter,
    pub pets: Vec<Pet>,
}

/// Validated shelter creation payload. Contact fields arrive flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShelter {
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl ShelterChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, shelter: &mut Shelter) {
        if let Some(name) = &self.name {
            shelter.name = name.clone();
        }
        if let Some(location) = &self.location {
            shelter.location = location.clone();
        }
        if let Some(email) = &self.email {
            shelter.contact.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            shelter.contact.phone = phone.clone();
        }
        if let Some(description) = &self.description {
            shelter.description = description.clone();
        }
        if self.rating.is_some() {
            shelter.rating = self.rating;
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelter_name: Option<String>,
    /// Favorited pets in the order they were added, without duplicates.
    #[serde(default)]
    pub favorites: Vec<PetId>,
}

impl Profile {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            display_name: None,
            role: UserRole::default(),
            shelter_name: None,
            favorites: Vec::new(),
        }
    }

    pub fn is_shelter(&self) -> bool {
        self.role == UserRole::Shelter
    }

    /// Returns `true` when the favorite was newly added.
    pub fn add_favorite(&mut self, pet_id: PetId) -> bool {
        if self.favorites.contains(&pet_id) {
            return false;
        }
        self.favorites.push(pet_id);
        true
    }

    /// Returns `true` when the favorite was present.
    pub fn remove_favorite(&mut self, pet_id: &PetId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|id| id != pet_id);
        before != self.favorites.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub shelter_name: Option<String>,
}

impl ProfileChanges {
    pub fn apply(&self, profile: &mut Profile) {
        if self.email.is_some() {
            profile.email = self.email.clone();
        }
        if self.display_name.is_some() {
            profile.display_name = self.display_name.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if self.shelter_name.is_some() {
            profile.shelter_name = self.shelter_name.clone();
        }
    }
}

// ============================================================================
// Adoption applications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionApplication {
    pub id: ApplicationId,
    pub pet_id: PetId,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// An application joined with the pet it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithPet {
    #[serde(flatten)]
    pub application: AdoptionApplication,
    pub pet: Option<Pet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub pet_id: PetId,
    pub user_id: UserId,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of a favorite-add request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub pet_id: PetId,
}
