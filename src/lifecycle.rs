//! Adoption application lifecycle.
//!
//! Transitions:
//!
//! - Pending → Approved
//! - Pending → Rejected
//! - Any → itself (re-affirm with new notes)
//!
//! Approved and Rejected are terminal. A pet may hold at most one approved
//! application. After every write the referenced pet's status is recomputed
//! from its applications (see [`crate::projection`]) when pet sync is enabled.

use crate::error::{ApiError, ApiResult};
use crate::metrics::METRICS;
use crate::model::{
    AdoptionApplication, ApplicationId, ApplicationStatus, ApplicationWithPet, NewApplication,
    PetId, StatusUpdate, UserId,
};
use crate::projection::{self, Availability};
use crate::store::{ApplicationStore, PetStore};
use crate::validation::ValidationError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot move application from {from} to {to}")]
    IllegalTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("pet {pet_id} already has approved application {application_id}")]
    AlreadyApproved {
        pet_id: PetId,
        application_id: ApplicationId,
    },
}

impl ApplicationStatus {
    /// Checks whether an application in this status may move to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::IllegalTransition`] for any move out of a
    /// terminal status.
    pub fn can_transition_to(&self, target: ApplicationStatus) -> Result<(), LifecycleError> {
        if *self == target || !self.is_terminal() {
            Ok(())
        } else {
            Err(LifecycleError::IllegalTransition {
                from: *self,
                to: target,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

/// Application operations plus the pet-status side effect.
#[derive(Clone)]
pub struct AdoptionService {
    pets: Arc<dyn PetStore>,
    applications: Arc<dyn ApplicationStore>,
    sync_pet_status: bool,
}

impl AdoptionService {
    pub fn new(
        pets: Arc<dyn PetStore>,
        applications: Arc<dyn ApplicationStore>,
        sync_pet_status: bool,
    ) -> Self {
        Self {
            pets,
            applications,
            sync_pet_status,
        }
    }

    /// Records a new pending application against an existing pet.
    ///
    /// The user id is an auth-provider identity and is taken as given. The
    /// pet's current availability is not checked.
    pub async fn submit(&self, request: NewApplication) -> ApiResult<AdoptionApplication> {
        if self.pets.get(&request.pet_id).await?.is_none() {
            return Err(ValidationError::single(
                "petId",
                "does not reference an existing pet",
            )
            .into());
        }

        let application = self.applications.create(request).await?;
        info!(
            application_id = %application.id,
            pet_id = %application.pet_id,
            user_id = %application.user_id,
            "application submitted"
        );
        self.sync_pet(&application.pet_id).await;
        Ok(application)
    }

    pub async fn get(&self, id: &ApplicationId) -> ApiResult<AdoptionApplication> {
        self.applications
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Application", id))
    }

    pub async fn list_for_user(&self, user_id: &UserId) -> ApiResult<Vec<ApplicationWithPet>> {
        Ok(self.applications.list_for_user(user_id).await?)
    }

    pub async fn list_for_pet(&self, pet_id: &PetId) -> ApiResult<Vec<AdoptionApplication>> {
        if self.pets.get(pet_id).await?.is_none() {
            return Err(ApiError::not_found("Pet", pet_id));
        }
        Ok(self.applications.list_for_pet(pet_id).await?)
    }

    /// Moves an application to `update.status`. Notes are replaced only when
    /// the update carries them.
    pub async fn update_status(
        &self,
        id: &ApplicationId,
        update: StatusUpdate,
    ) -> ApiResult<AdoptionApplication> {
        let current = self.get(id).await?;
        current.status.can_transition_to(update.status)?;

        if update.status == ApplicationStatus::Approved
            && current.status != ApplicationStatus::Approved
        {
            let siblings = self.applications.list_for_pet(&current.pet_id).await?;
            if let Some(approved) = siblings
                .iter()
                .find(|app| app.status == ApplicationStatus::Approved && app.id != current.id)
            {
                return Err(LifecycleError::AlreadyApproved {
                    pet_id: current.pet_id.clone(),
                    application_id: approved.id.clone(),
                }
                .into());
            }
        }

        let updated = self
            .applications
            .update_status(id, update.status, update.notes)
            .await?
            .ok_or_else(|| ApiError::not_found("Application", id))?;

        METRICS.record_transition(current.status, updated.status);
        info!(
            application_id = %updated.id,
            pet_id = %updated.pet_id,
            from = %current.status,
            to = %updated.status,
            decided = updated.status.is_terminal(),
            "application status updated"
        );
        self.sync_pet(&updated.pet_id).await;
        Ok(updated)
    }

    /// Read-only projection of a pet's availability.
    pub async fn availability(&self, pet_id: &PetId) -> ApiResult<Availability> {
        let pet = self
            .pets
            .get(pet_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Pet", pet_id))?;
        let applications = self.applications.list_for_pet(pet_id).await?;
        Ok(projection::project(&pet, &applications))
    }

    /// Writes the projected status onto the pet when it differs.
    ///
    /// Failures are logged and left for the next call on this pet to heal;
    /// the application write they follow has already succeeded.
    async fn sync_pet(&self, pet_id: &PetId) {
        if !self.sync_pet_status {
            return;
        }
        let view = match self.availability(pet_id).await {
            Ok(view) => view,
            Err(err) => {
                warn!(pet_id = %pet_id, error = %err, "pet status sync skipped");
                return;
            }
        };
        if view.consistent {
            return;
        }
        match self.pets.set_status(pet_id, view.effective_status).await {
            Ok(_) => info!(
                pet_id = %pet_id,
                from = %view.stored_status,
                to = %view.effective_status,
                "pet status synced"
            ),
            Err(err) => warn!(
                pet_id = %pet_id,
                target = %view.effective_status,
                error = %err,
                "pet status sync failed"
            ),
        }
    }
}
