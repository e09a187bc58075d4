//! Automation service — use-cases for managing automations.

use taskhook_domain::automation::{Automation, AutomationLog};
use taskhook_domain::error::{NotFoundError, TaskhookError};
use taskhook_domain::id::{AutomationId, UserId};

use crate::ports::AutomationRepository;

/// Application service for automation CRUD operations.
pub struct AutomationService<R> {
    repo: R,
}

impl<R: AutomationRepository> AutomationService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create a new automation after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(
        skip(self, automation),
        fields(automation_name = %automation.name, owner_id = %automation.owner_id)
    )]
    pub async fn create_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, TaskhookError> {
        automation.validate()?;
        self.repo.create(automation).await
    }

    /// Look up an automation by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] when no automation with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_automation(&self, id: AutomationId) -> Result<Automation, TaskhookError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List automations, optionally only those of `owner`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_automations(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<Automation>, TaskhookError> {
        self.repo.list(owner).await
    }

    /// Replace an automation's definition. Run counters are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] if invariants fail,
    /// [`TaskhookError::NotFound`] if it does not exist, or a storage error.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, TaskhookError> {
        automation.validate()?;
        self.repo.update(automation).await
    }

    /// Delete an automation by id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] if it does not exist, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_automation(&self, id: AutomationId) -> Result<(), TaskhookError> {
        self.repo.delete(id).await
    }

    /// Most recent runs of an automation, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::NotFound`] if the automation does not exist,
    /// or a storage error.
    pub async fn list_logs(
        &self,
        id: AutomationId,
        limit: u32,
    ) -> Result<Vec<AutomationLog>, TaskhookError> {
        self.get_automation(id).await?;
        self.repo.list_logs(id, limit).await
    }
}
