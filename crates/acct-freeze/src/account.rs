//! # Account and Project Records
//!
//! The slices of the account and project tables that freezing reads and
//! writes: status, live entitlements, ownership. Everything else about an
//! account (credentials, billing, profile) belongs to other subsystems.

use serde::{Deserialize, Serialize};

use acct_core::{AccountId, ProjectId, UsageLimits};

/// Account status column. Codes are persisted.
///
/// `Inactive` and `Deleted` are owned by registration and deletion; freezing
/// never sets them but must be able to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AccountStatus {
    Inactive = 0,
    Active = 1,
    Deleted = 2,
    /// Scheduled for deletion; set by violation freezes and escalation.
    PendingDeletion = 3,
    LegalHold = 4,
    PendingBotVerification = 5,
}

impl AccountStatus {
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn from_code(code: i16) -> Option<AccountStatus> {
        match code {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            2 => Some(Self::Deleted),
            3 => Some(Self::PendingDeletion),
            4 => Some(Self::LegalHold),
            5 => Some(Self::PendingBotVerification),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
            Self::PendingDeletion => "PENDING_DELETION",
            Self::LegalHold => "LEGAL_HOLD",
            Self::PendingBotVerification => "PENDING_BOT_VERIFICATION",
        };
        f.write_str(s)
    }
}

/// An account as the freeze machinery sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub status: AccountStatus,
    /// Default project entitlements granted to this account. Only the
    /// capacity caps are meaningful at the account level.
    pub limits: UsageLimits,
}

impl Account {
    pub fn new(id: AccountId, email: impl Into<String>, limits: UsageLimits) -> Self {
        Self {
            id,
            email: email.into(),
            status: AccountStatus::Active,
            limits,
        }
    }
}

/// A project and its live entitlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: AccountId,
    pub limits: UsageLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            AccountStatus::Inactive,
            AccountStatus::Active,
            AccountStatus::Deleted,
            AccountStatus::PendingDeletion,
            AccountStatus::LegalHold,
            AccountStatus::PendingBotVerification,
        ] {
            assert_eq!(AccountStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(AccountStatus::from_code(6), None);
        assert_eq!(AccountStatus::from_code(-1), None);
    }

    #[test]
    fn test_new_account_is_active() {
        let account = Account::new(AccountId::new(), "a@example.test", UsageLimits::default());
        assert_eq!(account.status, AccountStatus::Active);
    }
}
