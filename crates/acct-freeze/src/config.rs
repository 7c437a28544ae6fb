//! # Freeze Configuration
//!
//! Grace periods, the trial-expiration rate ceiling, and the reminder
//! schedule. Loaded from YAML, then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `ACCT_FREEZE_BILLING_WARN_GRACE_DAYS` | `billing_warn_grace_days` |
//! | `ACCT_FREEZE_BILLING_FREEZE_GRACE_DAYS` | `billing_freeze_grace_days` |
//! | `ACCT_FREEZE_TRIAL_EXPIRATION_GRACE_DAYS` | `trial_expiration_grace_days` |
//! | `ACCT_FREEZE_DELAYED_BOT_FREEZE_DAYS` | `delayed_bot_freeze_days` |
//! | `ACCT_FREEZE_TRIAL_RATE_CEILING` | `trial_rate_ceiling.rate` |
//! | `ACCT_FREEZE_TRIAL_BURST_CEILING` | `trial_rate_ceiling.burst` |
//! | `ACCT_FREEZE_BILLING_WARNING_REMINDER_DAYS` | `billing_warning_reminder_days` (comma separated) |
//! | `ACCT_FREEZE_BILLING_FREEZE_REMINDER_DAYS` | `billing_freeze_reminder_days` (comma separated) |

use serde::{Deserialize, Serialize};

use crate::error::FreezeError;

/// Largest day count a grace period or reminder threshold may hold. Event
/// countdowns are persisted as 32-bit integers.
pub const MAX_DAYS: i64 = i32::MAX as i64;

/// Rate and burst applied to head/list/delete during a trial-expiration
/// freeze, so the owner can still see and remove data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCeiling {
    pub rate: i64,
    pub burst: i64,
}

impl Default for RateCeiling {
    fn default() -> Self {
        Self { rate: 1, burst: 1 }
    }
}

/// Tunables for the freeze lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeConfig {
    /// Days between a billing warning and the billing freeze.
    pub billing_warn_grace_days: i64,
    /// Days between a billing freeze and pending deletion.
    pub billing_freeze_grace_days: i64,
    /// Days between a trial-expiration freeze and pending deletion.
    /// Zero disables trial escalation entirely.
    pub trial_expiration_grace_days: i64,
    /// Delay used when a delayed bot freeze is requested without one.
    pub delayed_bot_freeze_days: i64,
    pub trial_rate_ceiling: RateCeiling,
    /// Reminder thresholds for billing warnings, in days since creation.
    /// Entry N applies once N reminders have been sent.
    pub billing_warning_reminder_days: Vec<i64>,
    /// Reminder thresholds for billing freezes, in days since creation.
    pub billing_freeze_reminder_days: Vec<i64>,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            billing_warn_grace_days: 15,
            billing_freeze_grace_days: 60,
            trial_expiration_grace_days: 0,
            delayed_bot_freeze_days: 3,
            trial_rate_ceiling: RateCeiling::default(),
            billing_warning_reminder_days: vec![10, 4],
            billing_freeze_reminder_days: vec![30, 20, 9],
        }
    }
}

impl FreezeConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FreezeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| FreezeError::Config(format!("yaml: {e}")))
    }

    /// Override fields from `ACCT_FREEZE_*` process environment variables.
    pub fn apply_env(self) -> Result<Self, FreezeError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FreezeError> {
        let int = |name: &str| -> Result<Option<i64>, FreezeError> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<i64>()
                        .map_err(|e| FreezeError::Config(format!("{name}={raw:?}: {e}")))
                })
                .transpose()
        };
        let list = |name: &str| -> Result<Option<Vec<i64>>, FreezeError> {
            lookup(name)
                .map(|raw| parse_day_list(&raw).map_err(|e| FreezeError::Config(format!("{name}: {e}"))))
                .transpose()
        };

        if let Some(v) = int("ACCT_FREEZE_BILLING_WARN_GRACE_DAYS")? {
            self.billing_warn_grace_days = v;
        }
        if let Some(v) = int("ACCT_FREEZE_BILLING_FREEZE_GRACE_DAYS")? {
            self.billing_freeze_grace_days = v;
        }
        if let Some(v) = int("ACCT_FREEZE_TRIAL_EXPIRATION_GRACE_DAYS")? {
            self.trial_expiration_grace_days = v;
        }
        if let Some(v) = int("ACCT_FREEZE_DELAYED_BOT_FREEZE_DAYS")? {
            self.delayed_bot_freeze_days = v;
        }
        if let Some(v) = int("ACCT_FREEZE_TRIAL_RATE_CEILING")? {
            self.trial_rate_ceiling.rate = v;
        }
        if let Some(v) = int("ACCT_FREEZE_TRIAL_BURST_CEILING")? {
            self.trial_rate_ceiling.burst = v;
        }
        if let Some(v) = list("ACCT_FREEZE_BILLING_WARNING_REMINDER_DAYS")? {
            self.billing_warning_reminder_days = v;
        }
        if let Some(v) = list("ACCT_FREEZE_BILLING_FREEZE_REMINDER_DAYS")? {
            self.billing_freeze_reminder_days = v;
        }
        Ok(self)
    }

    /// Reject values the lifecycle cannot work with.
    pub fn validate(&self) -> Result<(), FreezeError> {
        let grace = [
            ("billing_warn_grace_days", self.billing_warn_grace_days),
            ("billing_freeze_grace_days", self.billing_freeze_grace_days),
            ("trial_expiration_grace_days", self.trial_expiration_grace_days),
            ("delayed_bot_freeze_days", self.delayed_bot_freeze_days),
        ];
        for (name, value) in grace {
            if !(0..=MAX_DAYS).contains(&value) {
                return Err(FreezeError::Config(format!(
                    "{name} must be in 0..={MAX_DAYS}, got {value}"
                )));
            }
        }
        if self.trial_rate_ceiling.rate <= 0 || self.trial_rate_ceiling.burst <= 0 {
            return Err(FreezeError::Config(format!(
                "trial_rate_ceiling must be > 0, got rate={} burst={}",
                self.trial_rate_ceiling.rate, self.trial_rate_ceiling.burst
            )));
        }
        for (name, days) in [
            ("billing_warning_reminder_days", &self.billing_warning_reminder_days),
            ("billing_freeze_reminder_days", &self.billing_freeze_reminder_days),
        ] {
            if let Some(bad) = days.iter().find(|d| !(0..=MAX_DAYS).contains(*d)) {
                return Err(FreezeError::Config(format!(
                    "{name} entry {bad} is outside 0..={MAX_DAYS}"
                )));
            }
        }
        Ok(())
    }

    /// Whether trial-expiration freezes escalate at all.
    pub fn trial_escalation_enabled(&self) -> bool {
        self.trial_expiration_grace_days > 0
    }
}

fn parse_day_list(raw: &str) -> Result<Vec<i64>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<i64>)
        .collect()
}
