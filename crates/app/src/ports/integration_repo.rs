//! Integration settings port.

use std::future::Future;
use std::sync::Arc;

use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::UserId;
use taskhook_domain::integration::IntegrationSettings;

/// Per-user integration settings store.
pub trait IntegrationRepository {
    /// Settings for `owner`; defaults when nothing was saved yet.
    fn get_settings(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send;

    /// Insert or replace the settings of `owner`.
    fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send;
}

impl<T: IntegrationRepository + Send + Sync> IntegrationRepository for Arc<T> {
    fn get_settings(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send {
        (**self).get_settings(owner)
    }

    fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> impl Future<Output = Result<IntegrationSettings, TaskhookError>> + Send {
        (**self).save_settings(owner, settings)
    }
}
