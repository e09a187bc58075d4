//! Per-user integration settings consumed by notification actions.

use serde::{Deserialize, Serialize};

use crate::error::{TaskhookError, ValidationError};

/// Where a user's notifications go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    /// Slack incoming-webhook URL. `None` means notifications are skipped.
    pub slack_webhook_url: Option<String>,
}

impl IntegrationSettings {
    /// Check the Slack URL, if any, looks like an http(s) endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUrl`] otherwise.
    pub fn validate(&self) -> Result<(), TaskhookError> {
        match self.slack_webhook_url.as_deref() {
            None => Ok(()),
            Some(url) if url.starts_with("https://") || url.starts_with("http://") => Ok(()),
            Some(url) => Err(ValidationError::InvalidUrl(url.to_string()).into()),
        }
    }

    /// The configured Slack URL, ignoring blank values.
    #[must_use]
    pub fn slack_url(&self) -> Option<&str> {
        self.slack_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
