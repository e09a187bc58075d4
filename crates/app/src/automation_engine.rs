//! Automation engine — reacts to events by evaluating and executing automations.
//!
//! For each incoming event the engine loads the owner's active automations,
//! keeps those whose trigger listens to the event, and for each one in turn
//! (oldest first) evaluates conditions, executes the action and records the
//! outcome before moving to the next. A failing rule is logged and recorded;
//! it never stops the rules after it, and nothing escapes
//! [`AutomationEngine::process`].

use taskhook_domain::automation::{Automation, AutomationLog};
use taskhook_domain::error::TaskhookError;
use taskhook_domain::event::DomainEvent;

use crate::action_executor::ActionExecutor;
use crate::error_chain;
use crate::ports::{AutomationRepository, HttpTransport, IntegrationRepository, TaskRepository};

/// Counts of what happened while processing one event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Active rules listening to the event.
    pub matched: usize,
    /// Rules whose conditions did not hold.
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Reactive automation engine.
pub struct AutomationEngine<AR, TR, IR, H> {
    automations: AR,
    executor: ActionExecutor<TR, IR, H>,
}

impl<AR, TR, IR, H> AutomationEngine<AR, TR, IR, H>
where
    AR: AutomationRepository + Send + Sync,
    TR: TaskRepository + Send + Sync,
    IR: IntegrationRepository + Send + Sync,
    H: HttpTransport + Send + Sync,
{
    /// Create a new engine.
    pub fn new(automations: AR, executor: ActionExecutor<TR, IR, H>) -> Self {
        Self {
            automations,
            executor,
        }
    }

    /// Process one event. Never fails: errors are logged and swallowed.
    pub async fn process(&self, event: &DomainEvent) {
        match self.try_process(event).await {
            Ok(summary) if summary.matched > 0 => {
                tracing::info!(
                    event = %event.name,
                    matched = summary.matched,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "automations processed"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(
                    event = %event.name,
                    error = %error_chain(&err),
                    "automation engine failed to load rules"
                );
            }
        }
    }

    /// Process one event, reporting what ran.
    ///
    /// # Errors
    ///
    /// Returns an error only when the active rules cannot be loaded. Failures
    /// of individual rules are recorded in their log, not returned.
    #[tracing::instrument(skip(self, event), fields(event = %event.name))]
    pub async fn try_process(&self, event: &DomainEvent) -> Result<RunSummary, TaskhookError> {
        let rules = self.automations.find_active(event.owner_id.clone()).await?;
        let mut summary = RunSummary::default();

        for rule in rules.iter().filter(|rule| rule.listens_to(event.name)) {
            summary.matched += 1;
            if !rule.trigger.conditions_hold(&event.snapshot) {
                summary.skipped += 1;
                continue;
            }
            if self.run_rule(rule, event).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        Ok(summary)
    }

    /// Execute one rule and record its outcome. Returns `true` on success.
    async fn run_rule(&self, rule: &Automation, event: &DomainEvent) -> bool {
        let log = match self
            .executor
            .execute(&rule.action, &event.snapshot, &rule.owner_id)
            .await
        {
            Ok(()) => AutomationLog::succeeded(rule.id, event.name, &event.snapshot),
            Err(err) => {
                let message = error_chain(&err);
                tracing::warn!(
                    automation_id = %rule.id,
                    action = %rule.action,
                    error = %message,
                    "automation failed"
                );
                AutomationLog::failed(rule.id, event.name, &event.snapshot, message)
            }
        };
        let success = log.success;

        if let Err(err) = self.automations.record_outcome(log).await {
            tracing::error!(
                automation_id = %rule.id,
                error = %error_chain(&err),
                "failed to record automation outcome"
            );
        }
        success
    }
}
