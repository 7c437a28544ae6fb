//! # Freeze Errors
//!
//! `StoreError` is what a store implementation reports; `FreezeError` is
//! what the lifecycle operations report to their callers. Store failures
//! reach callers wrapped with the name of the operation that hit them.

use thiserror::Error;

use acct_core::AccountId;

use crate::account::AccountStatus;
use crate::kind::FreezeKind;

// ─── Store Errors ────────────────────────────────────────────────────

/// Errors surfaced by a [`crate::store::FreezeStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row the operation depends on does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("account", "project", "freeze event").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Serialization failure or deadlock. Retrying the whole operation
    /// may succeed.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded.
    #[error("corrupt {entity} row: {reason}")]
    Corrupt {
        entity: &'static str,
        reason: String,
    },

    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Transient failures that a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }
}

// ─── Freeze Errors ───────────────────────────────────────────────────

/// What prevented a freeze from being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceBlocker {
    /// An event of this kind already exists.
    Event(FreezeKind),
    /// The account is already in this status.
    Status(AccountStatus),
}

impl std::fmt::Display for PrecedenceBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(kind) => write!(f, "{kind}"),
            Self::Status(status) => write!(f, "status {status}"),
        }
    }
}

/// Errors returned by the freeze lifecycle operations.
#[derive(Error, Debug)]
pub enum FreezeError {
    /// A higher-precedence restriction is already in place.
    #[error("account {account} is already frozen ({blocker}); cannot apply {requested}")]
    AlreadyFrozen {
        account: AccountId,
        requested: FreezeKind,
        blocker: PrecedenceBlocker,
    },

    /// Unfreeze/unwarn found nothing to undo.
    #[error("account {account} has no {kind} event")]
    NoFreezeStatus { account: AccountId, kind: FreezeKind },

    /// The event exists but carries no limit snapshot to restore from.
    #[error("{kind} event for account {account} has no limit snapshot")]
    MissingSnapshot { account: AccountId, kind: FreezeKind },

    /// The event was removed between the escalation check and the act.
    #[error("{kind} event for account {account} no longer exists")]
    EventVanished { account: AccountId, kind: FreezeKind },

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// A freeze kind name or code did not parse.
    #[error("unknown freeze kind: {0:?}")]
    UnknownKind(String),

    /// The operation does not apply to this kind.
    #[error("{operation} does not apply to {kind}")]
    UnsupportedKind {
        operation: &'static str,
        kind: FreezeKind,
    },

    #[error("invalid freeze configuration: {0}")]
    Config(String),

    /// The backing store failed.
    #[error("{op}: {source}")]
    Store {
        /// Operation that was running.
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl FreezeError {
    /// True only for a wrapped transient store failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Blocked by precedence rather than failed.
    pub fn is_precedence(&self) -> bool {
        matches!(self, Self::AlreadyFrozen { .. })
    }
}

/// Attach the operation name to a store failure.
pub(crate) trait StoreResultExt<T> {
    fn during(self, op: &'static str) -> Result<T, FreezeError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn during(self, op: &'static str) -> Result<T, FreezeError> {
        self.map_err(|source| FreezeError::Store { op, source })
    }
}
