//! # Store Contract
//!
//! The lifecycle runs every operation as one unit of work. A store hands out
//! a transaction ([`FreezeTx`]) through which every read and write of
//! accounts, projects, sessions and freeze events flows; `commit` publishes
//! the whole unit and dropping the transaction uncommitted discards it.
//!
//! ## Isolation
//!
//! Implementations must give each transaction at least serializable
//! isolation per account: a concurrent unfreeze must not delete the event a
//! freeze is about to read as its carry-over source. A conflict detected by
//! the store is reported as [`StoreError::Conflict`], never as a missing row.

use acct_core::{AccountId, ProjectId, UsageLimits};

use crate::account::{Account, AccountStatus, Project};
use crate::error::StoreError;
use crate::event::{FreezeEvent, FreezeEvents, FreezeEventsCursor, FreezeEventsPage};
use crate::kind::FreezeKind;

/// Source of transactions.
#[allow(async_fn_in_trait)]
pub trait FreezeStore: Send + Sync {
    type Tx: FreezeTx;

    /// Open a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One unit of work.
#[allow(async_fn_in_trait)]
pub trait FreezeTx: Send {
    // ─── Accounts ────────────────────────────────────────────────────

    async fn account(&mut self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    async fn update_account_status(
        &mut self,
        id: &AccountId,
        status: AccountStatus,
    ) -> Result<(), StoreError>;

    async fn update_account_limits(
        &mut self,
        id: &AccountId,
        limits: &UsageLimits,
    ) -> Result<(), StoreError>;

    // ─── Projects ────────────────────────────────────────────────────

    /// Projects owned by `owner`, in id order.
    async fn owned_projects(&mut self, owner: &AccountId) -> Result<Vec<Project>, StoreError>;

    /// Overwrite a project's entitlements. Returns `false` when the project
    /// no longer exists.
    async fn update_project_limits(
        &mut self,
        id: &ProjectId,
        limits: &UsageLimits,
    ) -> Result<bool, StoreError>;

    /// Number of projects owned by `owner` that have at least one member
    /// other than the owner.
    async fn shared_project_count(&mut self, owner: &AccountId) -> Result<u64, StoreError>;

    // ─── Sessions ────────────────────────────────────────────────────

    /// Delete every web session of `account`. Returns how many were removed.
    async fn delete_sessions(&mut self, account: &AccountId) -> Result<u64, StoreError>;

    // ─── Freeze Events ───────────────────────────────────────────────

    async fn freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<Option<FreezeEvent>, StoreError>;

    async fn freeze_events(&mut self, account: &AccountId) -> Result<FreezeEvents, StoreError>;

    /// Insert or replace the event for `(event.account_id, event.kind)`.
    ///
    /// An existing row keeps its `created_at`; the returned event is the
    /// row as stored.
    async fn upsert_freeze_event(&mut self, event: &FreezeEvent) -> Result<FreezeEvent, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError>;

    /// Page over events in `(account_id, kind)` order, optionally limited to
    /// `kinds`.
    async fn list_freeze_events(
        &mut self,
        cursor: &FreezeEventsCursor,
        kinds: Option<&[FreezeKind]>,
    ) -> Result<FreezeEventsPage, StoreError>;

    /// Add one to the event's notification counter. Returns `false` when the
    /// event does not exist.
    async fn increment_notifications(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError>;

    // ─── Completion ──────────────────────────────────────────────────

    /// Publish every write made through this transaction.
    async fn commit(self) -> Result<(), StoreError>;
}
