//! # Freeze Rule Table
//!
//! Every per-kind decision of the lifecycle lives in one table: what blocks
//! a freeze, whose snapshot it inherits, which events it supersedes, how it
//! moves the account status, and how hard it zeroes entitlements. The
//! lifecycle operations consult [`rule_for`] and [`check_precedence`] and
//! contain no kind-specific branches of their own.
//!
//! ## Table
//!
//! | Kind | Blocked by | Donors | Also deletes | Status on freeze | Status on unfreeze |
//! |---|---|---|---|---|---|
//! | BillingWarning | Violation, Billing, Legal | | | | |
//! | BillingFreeze | Violation, Legal, DelayedBot, Bot | | Warning | | PendingDeletion → Active |
//! | ViolationFreeze | Legal, Bot | Billing, Trial, Warning | | PendingDeletion | Active |
//! | LegalFreeze | Violation, Bot | Billing, Trial, Warning | | LegalHold | LegalHold → Active |
//! | DelayedBotFreeze | | | | | |
//! | BotFreeze | Bot, Violation, Legal, status PendingBotVerification | Billing, Trial | DelayedBot, Billing, Trial | PendingBotVerification | Active |
//! | TrialExpirationFreeze | Violation, Legal, Bot | | | | PendingDeletion → Active |

use crate::account::AccountStatus;
use crate::error::{FreezeError, PrecedenceBlocker};
use crate::event::FreezeEvents;
use crate::kind::FreezeKind;

use acct_core::AccountId;

/// How an operation moves the account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Always(AccountStatus),
    /// Only when the account is currently in `from`.
    IfCurrently {
        from: AccountStatus,
        to: AccountStatus,
    },
}

impl StatusChange {
    /// The status to write, or `None` when nothing changes.
    pub fn resolve(&self, current: AccountStatus) -> Option<AccountStatus> {
        match *self {
            Self::Unchanged => None,
            Self::Always(to) => Some(to),
            Self::IfCurrently { from, to } if current == from => Some(to),
            Self::IfCurrently { .. } => None,
        }
    }
}

/// Zeroing family applied to live entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zeroing {
    /// No snapshot, no zeroing.
    None,
    /// Capacity caps only.
    CapsOnly,
    /// Capacity caps and every rate/burst cap.
    Full,
    /// Like `Full`, except head/list/delete keep the configured ceiling.
    TrialExpiration,
}

/// Which configured grace period seeds `days_till_escalation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationGrace {
    /// Never escalates.
    Never,
    BillingWarn,
    BillingFreeze,
    /// Disabled when the trial grace period is zero.
    TrialExpiration,
    DelayedBot,
}

/// Everything the lifecycle needs to know about one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeRule {
    pub kind: FreezeKind,
    pub blocked_by: &'static [FreezeKind],
    pub blocked_by_status: Option<AccountStatus>,
    /// Carry-over sources, first present wins. The donor event is deleted.
    pub donors: &'static [FreezeKind],
    /// Deleted on freeze whether or not they donated.
    pub also_deletes: &'static [FreezeKind],
    pub status_on_freeze: StatusChange,
    pub status_on_unfreeze: StatusChange,
    pub zeroing: Zeroing,
    pub invalidates_sessions: bool,
    pub escalation_grace: EscalationGrace,
}

use FreezeKind::*;

const WARNING: FreezeRule = FreezeRule {
    kind: BillingWarning,
    blocked_by: &[ViolationFreeze, BillingFreeze, LegalFreeze],
    blocked_by_status: None,
    donors: &[],
    also_deletes: &[],
    status_on_freeze: StatusChange::Unchanged,
    status_on_unfreeze: StatusChange::Unchanged,
    zeroing: Zeroing::None,
    invalidates_sessions: false,
    escalation_grace: EscalationGrace::BillingWarn,
};

const BILLING: FreezeRule = FreezeRule {
    kind: BillingFreeze,
    blocked_by: &[ViolationFreeze, LegalFreeze, DelayedBotFreeze, BotFreeze],
    blocked_by_status: None,
    donors: &[],
    also_deletes: &[BillingWarning],
    status_on_freeze: StatusChange::Unchanged,
    status_on_unfreeze: StatusChange::IfCurrently {
        from: AccountStatus::PendingDeletion,
        to: AccountStatus::Active,
    },
    zeroing: Zeroing::CapsOnly,
    invalidates_sessions: false,
    escalation_grace: EscalationGrace::BillingFreeze,
};

const VIOLATION: FreezeRule = FreezeRule {
    kind: ViolationFreeze,
    blocked_by: &[LegalFreeze, BotFreeze],
    blocked_by_status: None,
    donors: &[BillingFreeze, TrialExpirationFreeze, BillingWarning],
    also_deletes: &[],
    status_on_freeze: StatusChange::Always(AccountStatus::PendingDeletion),
    status_on_unfreeze: StatusChange::Always(AccountStatus::Active),
    zeroing: Zeroing::Full,
    invalidates_sessions: false,
    escalation_grace: EscalationGrace::Never,
};

const LEGAL: FreezeRule = FreezeRule {
    kind: LegalFreeze,
    blocked_by: &[ViolationFreeze, BotFreeze],
    blocked_by_status: None,
    donors: &[BillingFreeze, TrialExpirationFreeze, BillingWarning],
    also_deletes: &[],
    status_on_freeze: StatusChange::Always(AccountStatus::LegalHold),
    status_on_unfreeze: StatusChange::IfCurrently {
        from: AccountStatus::LegalHold,
        to: AccountStatus::Active,
    },
    zeroing: Zeroing::Full,
    invalidates_sessions: true,
    escalation_grace: EscalationGrace::Never,
};

const DELAYED_BOT: FreezeRule = FreezeRule {
    kind: DelayedBotFreeze,
    blocked_by: &[],
    blocked_by_status: None,
    donors: &[],
    also_deletes: &[],
    status_on_freeze: StatusChange::Unchanged,
    status_on_unfreeze: StatusChange::Unchanged,
    zeroing: Zeroing::None,
    invalidates_sessions: false,
    escalation_grace: EscalationGrace::DelayedBot,
};

const BOT: FreezeRule = FreezeRule {
    kind: BotFreeze,
    blocked_by: &[BotFreeze, ViolationFreeze, LegalFreeze],
    blocked_by_status: Some(AccountStatus::PendingBotVerification),
    donors: &[BillingFreeze, TrialExpirationFreeze],
    also_deletes: &[DelayedBotFreeze, BillingFreeze, TrialExpirationFreeze],
    status_on_freeze: StatusChange::Always(AccountStatus::PendingBotVerification),
    status_on_unfreeze: StatusChange::Always(AccountStatus::Active),
    zeroing: Zeroing::Full,
    invalidates_sessions: true,
    escalation_grace: EscalationGrace::Never,
};

const TRIAL: FreezeRule = FreezeRule {
    kind: TrialExpirationFreeze,
    blocked_by: &[ViolationFreeze, LegalFreeze, BotFreeze],
    blocked_by_status: None,
    donors: &[],
    also_deletes: &[],
    status_on_freeze: StatusChange::Unchanged,
    status_on_unfreeze: StatusChange::IfCurrently {
        from: AccountStatus::PendingDeletion,
        to: AccountStatus::Active,
    },
    zeroing: Zeroing::TrialExpiration,
    invalidates_sessions: false,
    escalation_grace: EscalationGrace::TrialExpiration,
};

/// The rule for `kind`.
pub fn rule_for(kind: FreezeKind) -> &'static FreezeRule {
    match kind {
        BillingWarning => &WARNING,
        BillingFreeze => &BILLING,
        ViolationFreeze => &VIOLATION,
        LegalFreeze => &LEGAL,
        DelayedBotFreeze => &DELAYED_BOT,
        BotFreeze => &BOT,
        TrialExpirationFreeze => &TRIAL,
    }
}

/// Reject a freeze of `kind` if an event in its `blocked_by` list exists or
/// the account is in its blocking status.
///
/// Blocking events are reported in table order, so the error names the
/// first listed blocker rather than an arbitrary one.
pub fn check_precedence(
    account: AccountId,
    kind: FreezeKind,
    events: &FreezeEvents,
    status: AccountStatus,
) -> Result<(), FreezeError> {
    let rule = rule_for(kind);

    if rule.blocked_by_status == Some(status) {
        return Err(FreezeError::AlreadyFrozen {
            account,
            requested: kind,
            blocker: PrecedenceBlocker::Status(status),
        });
    }

    if let Some(blocker) = rule.blocked_by.iter().find(|k| events.contains(**k)) {
        return Err(FreezeError::AlreadyFrozen {
            account,
            requested: kind,
            blocker: PrecedenceBlocker::Event(*blocker),
        });
    }

    Ok(())
}

/// The event whose snapshot `kind` inherits, if any.
pub fn donor_for(kind: FreezeKind, events: &FreezeEvents) -> Option<FreezeKind> {
    events.first_of(rule_for(kind).donors).map(|e| e.kind)
}
