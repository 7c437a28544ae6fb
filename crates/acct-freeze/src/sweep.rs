//! # Escalation Sweep
//!
//! One pass of the periodic escalation job for a single target kind. The
//! sweep pages through the events of that kind, evaluates each one, and acts
//! on those that are due. A failure on one event is logged and counted and
//! the pass moves on; only a failure to list events aborts it.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use acct_core::Timestamp;

use crate::error::FreezeError;
use crate::event::{FreezeEvent, FreezeEventsCursor};
use crate::kind::FreezeKind;
use crate::service::AccountFreezeService;
use crate::store::FreezeStore;

/// Which events a sweep processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepTarget {
    /// Escalate aged trial-expiration freezes to pending deletion.
    TrialExpiration,
    /// Promote billing warnings past their grace period into billing freezes.
    BillingWarning,
    /// Escalate aged billing freezes to pending deletion.
    BillingFreeze,
    /// Promote due delayed bot freezes into bot freezes.
    DelayedBot,
}

impl SweepTarget {
    /// Warnings run before billing freezes, so a warning promoted in a pass
    /// starts its own countdown instead of escalating in the same pass.
    pub const ALL: [SweepTarget; 4] = [
        Self::TrialExpiration,
        Self::BillingWarning,
        Self::BillingFreeze,
        Self::DelayedBot,
    ];

    /// The event kind this target pages over.
    pub fn kind(&self) -> FreezeKind {
        match self {
            Self::TrialExpiration => FreezeKind::TrialExpirationFreeze,
            Self::BillingWarning => FreezeKind::BillingWarning,
            Self::BillingFreeze => FreezeKind::BillingFreeze,
            Self::DelayedBot => FreezeKind::DelayedBotFreeze,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrialExpiration => "trial-expiration",
            Self::BillingWarning => "billing-warning",
            Self::BillingFreeze => "billing-freeze",
            Self::DelayedBot => "delayed-bot",
        }
    }
}

impl fmt::Display for SweepTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepTarget {
    type Err = FreezeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| FreezeError::UnknownKind(s.to_string()))
    }
}

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub target: SweepTarget,
    /// Events looked at.
    pub examined: usize,
    /// Events escalated or promoted.
    pub escalated: usize,
    /// Not due, blocked, or gone by the time they were acted on.
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    fn new(target: SweepTarget) -> Self {
        Self {
            target,
            examined: 0,
            escalated: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

enum Outcome {
    Escalated,
    Skipped,
    Failed,
}

impl<S: FreezeStore> AccountFreezeService<S> {
    /// Run one sweep pass for `target` as of `now`.
    pub async fn sweep(
        &self,
        target: SweepTarget,
        now: Timestamp,
        page_size: usize,
    ) -> Result<SweepReport, FreezeError> {
        let kinds = [target.kind()];
        let mut report = SweepReport::new(target);
        let mut cursor = FreezeEventsCursor::first(page_size);

        loop {
            let page = self.list_events(&cursor, Some(&kinds)).await?;
            for event in &page.events {
                report.examined += 1;
                match self.sweep_one(target, event, now).await {
                    Outcome::Escalated => report.escalated += 1,
                    Outcome::Skipped => report.skipped += 1,
                    Outcome::Failed => report.failed += 1,
                }
            }
            match page.next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        tracing::info!(
            target_kind = %target,
            examined = report.examined,
            escalated = report.escalated,
            skipped = report.skipped,
            failed = report.failed,
            "escalation sweep finished"
        );
        Ok(report)
    }

    async fn sweep_one(&self, target: SweepTarget, event: &FreezeEvent, now: Timestamp) -> Outcome {
        let account = event.account_id;
        match self.should_escalate(event, now).await {
            Ok(true) => {}
            Ok(false) => return Outcome::Skipped,
            Err(err) => {
                tracing::error!(account = %account, kind = %event.kind, error = %err, "escalation check failed");
                return Outcome::Failed;
            }
        }

        let result = match target {
            SweepTarget::BillingWarning => {
                self.freeze(account, FreezeKind::BillingFreeze, false).await
            }
            SweepTarget::DelayedBot => self.freeze(account, FreezeKind::BotFreeze, false).await,
            SweepTarget::TrialExpiration | SweepTarget::BillingFreeze => {
                self.escalate(account, event).await
            }
        };

        match result {
            Ok(()) => Outcome::Escalated,
            Err(err @ FreezeError::EventVanished { .. }) => {
                tracing::warn!(account = %account, error = %err, "event gone before escalation");
                Outcome::Skipped
            }
            Err(err) if err.is_precedence() => {
                tracing::warn!(account = %account, error = %err, "promotion blocked");
                Outcome::Skipped
            }
            Err(err) => {
                tracing::error!(account = %account, kind = %event.kind, error = %err, "escalation failed");
                Outcome::Failed
            }
        }
    }
}
