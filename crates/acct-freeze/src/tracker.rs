//! # Analytics Tracker
//!
//! Fire-and-forget notices of freeze lifecycle changes. The service calls
//! the tracker only after the transaction has committed, and a tracker has
//! no way to fail the operation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use acct_core::AccountId;

use crate::kind::FreezeKind;

/// What happened to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeAction {
    Frozen,
    Unfrozen,
    Warned,
    Unwarned,
    /// Escalated to pending deletion.
    Escalated,
}

/// One analytics notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreezeNotice {
    pub account_id: AccountId,
    pub email: String,
    pub kind: FreezeKind,
    pub action: FreezeAction,
    pub admin_initiated: bool,
}

/// Sink for [`FreezeNotice`]s.
pub trait FreezeTracker: Send + Sync {
    fn track(&self, notice: &FreezeNotice);
}

/// Emits each notice as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl FreezeTracker for LogTracker {
    fn track(&self, notice: &FreezeNotice) {
        tracing::info!(
            target: "acct_freeze::analytics",
            account = %notice.account_id,
            kind = %notice.kind,
            action = ?notice.action,
            admin_initiated = notice.admin_initiated,
            "freeze notice"
        );
    }
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl FreezeTracker for NoopTracker {
    fn track(&self, _notice: &FreezeNotice) {}
}

/// Keeps every notice in memory. Cloning shares the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    notices: Arc<Mutex<Vec<FreezeNotice>>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices recorded so far.
    pub fn notices(&self) -> Vec<FreezeNotice> {
        self.notices.lock().clone()
    }

    pub fn actions(&self) -> Vec<(FreezeKind, FreezeAction)> {
        self.notices.lock().iter().map(|n| (n.kind, n.action)).collect()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl FreezeTracker for RecordingTracker {
    fn track(&self, notice: &FreezeNotice) {
        self.notices.lock().push(notice.clone());
    }
}
