//! # Freeze Kinds
//!
//! The closed set of restrictions an account can be placed under. The
//! numeric codes are the persisted discriminants of the freeze-event row
//! and must never be renumbered.
//!
//! ## Precedence
//!
//! ```text
//! LegalFreeze
//!   > ViolationFreeze ≈ BotFreeze
//!   > DelayedBotFreeze        (pending pre-state)
//!   > BillingFreeze ≈ TrialExpirationFreeze
//!   > BillingWarning
//! ```
//!
//! What blocks what is encoded in [`crate::rules`]; this module only names
//! the kinds.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FreezeError;

/// A restriction kind. At most one live event exists per (account, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum FreezeKind {
    /// Unpaid invoices past the warning grace period.
    BillingFreeze = 0,
    /// Unpaid invoices; the account may be frozen soon.
    BillingWarning = 1,
    /// Terms-of-service violation.
    ViolationFreeze = 2,
    /// Held for legal review.
    LegalFreeze = 3,
    /// Bot review scheduled after a delay. Not itself a freeze.
    DelayedBotFreeze = 4,
    /// Held for manual bot review.
    BotFreeze = 5,
    /// The free trial ended without an upgrade.
    TrialExpirationFreeze = 6,
}

impl FreezeKind {
    /// Every kind in code order.
    pub const ALL: [FreezeKind; 7] = [
        Self::BillingFreeze,
        Self::BillingWarning,
        Self::ViolationFreeze,
        Self::LegalFreeze,
        Self::DelayedBotFreeze,
        Self::BotFreeze,
        Self::TrialExpirationFreeze,
    ];

    /// The persisted discriminant.
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<FreezeKind> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Stable machine identifier, matching the serde encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BillingFreeze => "billing_freeze",
            Self::BillingWarning => "billing_warning",
            Self::ViolationFreeze => "violation_freeze",
            Self::LegalFreeze => "legal_freeze",
            Self::DelayedBotFreeze => "delayed_bot_freeze",
            Self::BotFreeze => "bot_freeze",
            Self::TrialExpirationFreeze => "trial_expiration_freeze",
        }
    }

    /// Whether freezing with this kind captures a limit snapshot.
    ///
    /// The warning and the delayed bot marker only record that the account
    /// is in a state; they never touch entitlements.
    pub fn takes_snapshot(&self) -> bool {
        !matches!(self, Self::BillingWarning | Self::DelayedBotFreeze)
    }
}

impl std::fmt::Display for FreezeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BillingFreeze => "Billing Freeze",
            Self::BillingWarning => "Billing Warning",
            Self::ViolationFreeze => "Violation Freeze",
            Self::LegalFreeze => "Legal Freeze",
            Self::DelayedBotFreeze => "Delayed Bot Freeze",
            Self::BotFreeze => "Bot Freeze",
            Self::TrialExpirationFreeze => "Trial Expiration Freeze",
        };
        f.write_str(s)
    }
}

impl FromStr for FreezeKind {
    type Err = FreezeError;

    /// Accepts the snake_case identifier or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i16>() {
            return Self::from_code(code).ok_or_else(|| FreezeError::UnknownKind(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FreezeError::UnknownKind(s.to_string()))
    }
}
