//! Per-entity field tables and typed payload parsing.

use super::rules::{FieldSpec, Rule, validate_record};
use super::{ValidationError, ValidationResult};
use crate::model::{
    ApplicationStatus, FavoriteRequest, NewApplication, NewPet, NewShelter, PetChanges, PetFilter,
    PetSize, PetStatus, Profile, ProfileChanges, ShelterChanges, Species, StatusUpdate, UserRole,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use strum::VariantNames;

const AGE: Rule = Rule::Integer {
    min: 0,
    max: Some(u32::MAX as i64),
};
const AGE_MONTHS: Rule = Rule::Integer {
    min: 0,
    max: Some(11),
};
const RATING: Rule = Rule::Number { min: 0.0, max: 5.0 };

pub const PET_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", Rule::Text),
    FieldSpec::required("species", Rule::OneOf(Species::VARIANTS)),
    FieldSpec::required("breed", Rule::Text),
    FieldSpec::required("age", AGE),
    FieldSpec::optional("ageMonths", AGE_MONTHS),
    FieldSpec::required("size", Rule::OneOf(PetSize::VARIANTS)),
    FieldSpec::optional("color", Rule::Text),
    FieldSpec::required("description", Rule::Text),
    FieldSpec::optional("medicalHistory", Rule::FreeText),
    FieldSpec::optional("images", Rule::UrlList),
    FieldSpec::optional("shelterId", Rule::Identifier),
];

pub const PET_QUERY_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("species", Rule::OneOf(Species::VARIANTS)),
    FieldSpec::optional("status", Rule::OneOf(PetStatus::VARIANTS)),
    FieldSpec::optional("age", AGE),
    FieldSpec::optional("size", Rule::OneOf(PetSize::VARIANTS)),
    FieldSpec::optional("shelterId", Rule::Identifier),
];

pub const SHELTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", Rule::Text),
    FieldSpec::required("location", Rule::Text),
    FieldSpec::required("email", Rule::Email),
    FieldSpec::required("phone", Rule::Text),
    FieldSpec::required("description", Rule::Text),
    FieldSpec::optional("rating", RATING),
];

pub const APPLICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("petId", Rule::Identifier),
    FieldSpec::required("userId", Rule::Identifier),
    FieldSpec::optional("notes", Rule::FreeText),
];

pub const STATUS_UPDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("status", Rule::OneOf(ApplicationStatus::VARIANTS)),
    FieldSpec::optional("notes", Rule::FreeText),
];

pub const PROFILE_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("email", Rule::Email),
    FieldSpec::optional("displayName", Rule::Text),
    FieldSpec::optional("role", Rule::OneOf(UserRole::VARIANTS)),
    FieldSpec::optional("shelterName", Rule::Text),
];

pub const FAVORITE_FIELDS: &[FieldSpec] = &[FieldSpec::required("petId", Rule::Identifier)];

pub fn pet_create(body: &Value) -> ValidationResult<NewPet> {
    parse(body, PET_FIELDS)
}

/// Same constraints as creation, every field optional. `status` is not
/// accepted from clients.
pub fn pet_update(body: &Value) -> ValidationResult<PetChanges> {
    parse(body, &all_optional(PET_FIELDS))
}

/// Query-string filters. Empty values are treated as absent.
pub fn pet_filter(params: &HashMap<String, String>) -> ValidationResult<PetFilter> {
    let record: Map<String, Value> = params
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    parse(&Value::Object(record), PET_QUERY_FIELDS)
}

pub fn shelter_create(body: &Value) -> ValidationResult<NewShelter> {
    parse(body, SHELTER_FIELDS)
}

pub fn shelter_update(body: &Value) -> ValidationResult<ShelterChanges> {
    parse(body, &all_optional(SHELTER_FIELDS))
}

pub fn application_create(body: &Value) -> ValidationResult<NewApplication> {
    parse(body, APPLICATION_FIELDS)
}

pub fn status_update(body: &Value) -> ValidationResult<StatusUpdate> {
    parse(body, STATUS_UPDATE_FIELDS)
}

pub fn profile_update(body: &Value) -> ValidationResult<ProfileChanges> {
    parse(body, PROFILE_FIELDS)
}

pub fn favorite(body: &Value) -> ValidationResult<FavoriteRequest> {
    parse(body, FAVORITE_FIELDS)
}

/// Cross-field check run on a profile after changes are merged.
pub fn check_profile(profile: &Profile) -> ValidationResult<()> {
    if profile.is_shelter() && profile.shelter_name.is_none() {
        return Err(ValidationError::single(
            "shelterName",
            "is required when role is shelter",
        ));
    }
    Ok(())
}

fn all_optional(specs: &[FieldSpec]) -> Vec<FieldSpec> {
    specs.iter().map(|spec| spec.as_optional()).collect()
}

fn parse<T: DeserializeOwned>(body: &Value, specs: &[FieldSpec]) -> ValidationResult<T> {
    let normalized = validate_record(body, specs)?;
    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| ValidationError::single("body", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PetId, UserId};
    use serde_json::json;

    fn max_payload() -> Value {
        json!({
            "name": "Max",
            "species": "dog",
            "breed": "Lab",
            "age": 2,
            "size": "medium",
            "description": "friendly"
        })
    }

    #[test]
    fn pet_create_accepts_minimal_payload() {
        let pet = pet_create(&max_payload()).expect("valid pet");
        assert_eq!(pet.species, Species::Dog);
        assert_eq!(pet.size, PetSize::Medium);
        assert_eq!(pet.age, 2);
        assert!(pet.images.is_empty());
    }

    #[test]
    fn pet_create_names_every_missing_field() {
        let err = pet_create(&json!({})).unwrap_err();
        for field in ["name", "species", "breed", "age", "size", "description"] {
            assert!(err.has_field(field), "missing {field}");
        }
        assert!(!err.has_field("color"));
    }

    #[test]
    fn pet_create_rejects_bad_enums_and_negative_age() {
        let mut body = max_payload();
        body["species"] = json!("hamster");
        body["age"] = json!(-1);
        let err = pet_create(&body).unwrap_err();
        assert!(err.has_field("species"));
        assert!(err.has_field("age"));
    }

    #[test]
    fn pet_update_allows_partial_but_checks_present_fields() {
        let changes = pet_update(&json!({"breed": " Beagle "})).expect("valid");
        assert_eq!(changes.breed.as_deref(), Some("Beagle"));
        assert!(changes.name.is_none());

        let err = pet_update(&json!({"name": ""})).unwrap_err();
        assert!(err.has_field("name"));
    }

    #[test]
    fn pet_update_ignores_client_status() {
        let changes = pet_update(&json!({"status": "adopted"})).expect("valid");
        assert!(changes.is_empty());
    }

    #[test]
    fn pet_filter_parses_query_strings() {
        let params = HashMap::from([
            ("species".to_string(), "cat".to_string()),
            ("age".to_string(), "3".to_string()),
            ("status".to_string(), String::new()),
        ]);
        let filter = pet_filter(&params).expect("valid filter");
        assert_eq!(filter.species, Some(Species::Cat));
        assert_eq!(filter.age, Some(3));
        assert_eq!(filter.status, None);

        let params = HashMap::from([("status".to_string(), "sold".to_string())]);
        assert!(pet_filter(&params).unwrap_err().has_field("status"));
    }

    #[test]
    fn shelter_requires_valid_email() {
        let err = shelter_create(&json!({
            "name": "Tails",
            "location": "Portland",
            "email": "nope",
            "phone": "555",
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.has_field("email"));

        let changes = shelter_update(&json!({"email": "ops@tails.org"})).expect("valid");
        assert_eq!(changes.email.as_deref(), Some("ops@tails.org"));
    }

    #[test]
    fn application_create_trims_notes() {
        let app = application_create(&json!({"petId": "p1", "userId": "u1", "notes": "  hi  "}))
            .expect("valid");
        assert_eq!(app.pet_id, PetId::new("p1"));
        assert_eq!(app.user_id, UserId::new("u1"));
        assert_eq!(app.notes.as_deref(), Some("hi"));
    }

    #[test]
    fn application_create_requires_both_references() {
        let err = application_create(&json!({"notes": "x"})).unwrap_err();
        assert!(err.has_field("petId"));
        assert!(err.has_field("userId"));
    }

    #[test]
    fn status_update_rejects_unknown_status() {
        let err = status_update(&json!({"status": "closed"})).unwrap_err();
        assert!(err.has_field("status"));
        let ok = status_update(&json!({"status": "approved"})).expect("valid");
        assert_eq!(ok.status, ApplicationStatus::Approved);
    }

    #[test]
    fn shelter_role_requires_shelter_name() {
        let mut profile = Profile::new(UserId::new("u1"));
        profile_update(&json!({"role": "shelter"}))
            .expect("valid")
            .apply(&mut profile);
        assert!(check_profile(&profile).unwrap_err().has_field("shelterName"));
        profile.shelter_name = Some("Happy Tails".to_string());
        assert!(check_profile(&profile).is_ok());
    }
}
