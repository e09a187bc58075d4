//! Integration service — per-user notification settings.

use taskhook_domain::error::TaskhookError;
use taskhook_domain::id::UserId;
use taskhook_domain::integration::IntegrationSettings;

use crate::ports::IntegrationRepository;

pub struct IntegrationService<R> {
    repo: R,
}

impl<R: IntegrationRepository> IntegrationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn get_settings(&self, owner: UserId) -> Result<IntegrationSettings, TaskhookError> {
        self.repo.get_settings(owner).await
    }

    /// Replace the settings of `owner`. A blank Slack URL is stored as unset.
    ///
    /// # Errors
    ///
    /// Returns [`TaskhookError::Validation`] for a non-http(s) Slack URL, or a
    /// storage error.
    #[tracing::instrument(skip(self, settings))]
    pub async fn save_settings(
        &self,
        owner: UserId,
        settings: IntegrationSettings,
    ) -> Result<IntegrationSettings, TaskhookError> {
        let settings = IntegrationSettings {
            slack_webhook_url: settings.slack_url().map(str::to_string),
        };
        settings.validate()?;
        self.repo.save_settings(owner, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryIntegrationRepo;

    #[tokio::test]
    async fn should_return_defaults_for_unknown_user() {
        let svc = IntegrationService::new(InMemoryIntegrationRepo::default());
        let settings = svc.get_settings(UserId::new("nobody")).await.unwrap();
        assert_eq!(settings, IntegrationSettings::default());
    }

    #[tokio::test]
    async fn should_save_and_normalize_slack_url() {
        let svc = IntegrationService::new(InMemoryIntegrationRepo::default());
        svc.save_settings(
            UserId::new("u1"),
            IntegrationSettings {
                slack_webhook_url: Some(" https://hooks.slack.test/x ".to_string()),
            },
        )
        .await
        .unwrap();

        let stored = svc.get_settings(UserId::new("u1")).await.unwrap();
        assert_eq!(
            stored.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.test/x")
        );
    }

    #[tokio::test]
    async fn should_clear_slack_url_when_blank() {
        let svc = IntegrationService::new(InMemoryIntegrationRepo::with_slack(
            "u1",
            "https://hooks.slack.test/x",
        ));
        let saved = svc
            .save_settings(
                UserId::new("u1"),
                IntegrationSettings {
                    slack_webhook_url: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.slack_webhook_url, None);
    }

    #[tokio::test]
    async fn should_reject_invalid_slack_url() {
        let svc = IntegrationService::new(InMemoryIntegrationRepo::default());
        let result = svc
            .save_settings(
                UserId::new("u1"),
                IntegrationSettings {
                    slack_webhook_url: Some("not a url".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(TaskhookError::Validation(_))));
    }
}
