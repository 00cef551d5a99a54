//! Pet availability derived from a pet's applications.
//!
//! The stored pet status is only a cached copy of this projection. When the
//! two disagree (for example after a pet write failed following an approval)
//! the next lifecycle call on that pet writes the projected value back.

use crate::model::{AdoptionApplication, ApplicationId, ApplicationStatus, Pet, PetId, PetStatus};
use serde::Serialize;

/// Status a pet should carry given every application against it.
///
/// Any approved application means `adopted`; otherwise any pending one
/// means `pending`; otherwise the pet is `available`.
pub fn effective_status(applications: &[AdoptionApplication]) -> PetStatus {
    if applications
        .iter()
        .any(|app| app.status == ApplicationStatus::Approved)
    {
        PetStatus::Adopted
    } else if applications
        .iter()
        .any(|app| app.status == ApplicationStatus::Pending)
    {
        PetStatus::Pending
    } else {
        PetStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub pet_id: PetId,
    pub stored_status: PetStatus,
    pub effective_status: PetStatus,
    /// Applications still awaiting a decision.
    pub open_applications: usize,
    pub approved_application_id: Option<ApplicationId>,
    pub consistent: bool,
}

pub fn project(pet: &Pet, applications: &[AdoptionApplication]) -> Availability {
    let effective = effective_status(applications);
    Availability {
        pet_id: pet.id.clone(),
        stored_status: pet.status,
        effective_status: effective,
        open_applications: applications
            .iter()
            .filter(|app| app.status == ApplicationStatus::Pending)
            .count(),
        approved_application_id: applications
            .iter()
            .find(|app| app.status == ApplicationStatus::Approved)
            .map(|app| app.id.clone()),
        consistent: pet.status == effective,
    }
}
