//! # Snapshot/Restore Engine
//!
//! Captures live entitlements into a [`LimitSnapshot`] before a freeze zeroes
//! them, and writes the snapshot back on unfreeze.
//!
//! ## No Double Zero
//!
//! A freeze applied on top of another zeroing freeze sees entitlements that
//! are already zero. Recording those zeros as "original" would lose the
//! customer's real limits once both freezes are lifted. While another
//! snapshot-bearing event exists for the account, capture therefore never
//! records a zeroed value:
//!
//! - the account entry is only overwritten when the live account caps are
//!   not zeroed; a zeroed placeholder left in the starting snapshot is
//!   replaced by the first superseded snapshot holding real caps;
//! - a zeroed project takes the entry already in the snapshot being built,
//!   else the first superseded snapshot's entry, else it is left out.
//!
//! Every event a freeze deletes hands its snapshot over this way, so the
//! originals survive even when they sit in an event other than the donor.
//!
//! Without an overlapping freeze, zero caps are the customer's real limits
//! and are recorded like any other value.
//!
//! Restore skips an account entry whose caps are zeroed: that value either
//! already matches what zeroing left in place, or is the unavoidable
//! placeholder of a fresh snapshot taken under an overlapping freeze.
//! An account whose real caps were zero before the freeze is therefore
//! not reset on unfreeze: caps an administrator set during the freeze
//! stay in place.
//!
//! Capture is a pure function over values read earlier in the same
//! transaction. The zeroing and restore steps write through the
//! transaction and never reread the snapshot they were given.

use acct_core::{AccountId, LimitSnapshot};

use crate::account::{Account, Project};
use crate::error::{FreezeError, StoreResultExt};
use crate::policy::ZeroingPolicy;
use crate::store::FreezeTx;

/// Outcome counters for one capture, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Projects recorded from live values.
    pub recorded: usize,
    /// Zeroed projects whose entry was kept or carried over.
    pub carried: usize,
    /// Zeroed projects with no prior entry.
    pub skipped: usize,
}

/// Build the snapshot for a freeze.
///
/// `base` is the snapshot of an existing event of the same kind (re-freeze).
/// `carry_over` holds the snapshots of the events this freeze supersedes,
/// donor first. Without `base` the snapshot starts from the donor, else
/// from the live account caps. `overlapping` is true when any
/// snapshot-bearing event already exists for the account, so zeroed live
/// values may be another freeze's doing.
pub fn capture(
    account: &Account,
    projects: &[Project],
    base: Option<&LimitSnapshot>,
    carry_over: &[&LimitSnapshot],
    overlapping: bool,
) -> (LimitSnapshot, CaptureStats) {
    let mut snapshot = base
        .or(carry_over.first().copied())
        .cloned()
        .unwrap_or_else(|| LimitSnapshot::for_account(account.limits));

    if !overlapping || !account.limits.caps_zeroed() {
        snapshot.account = account.limits;
    } else if snapshot.account.caps_zeroed() {
        if let Some(held) = carry_over.iter().find(|c| !c.account.caps_zeroed()) {
            snapshot.account = held.account;
        }
    }

    let mut stats = CaptureStats::default();
    for project in projects {
        if !overlapping || !project.limits.caps_zeroed() {
            snapshot.projects.insert(project.id, project.limits);
            stats.recorded += 1;
            continue;
        }
        if snapshot.projects.contains_key(&project.id) {
            stats.carried += 1;
            continue;
        }
        match carry_over.iter().find_map(|c| c.project(&project.id)) {
            Some(original) => {
                snapshot.projects.insert(project.id, *original);
                stats.carried += 1;
            }
            None => stats.skipped += 1,
        }
    }

    (snapshot, stats)
}

/// Zero the account caps and every project per `policy`.
pub async fn apply_zeroing<T: FreezeTx>(
    tx: &mut T,
    account: &Account,
    projects: &[Project],
    policy: ZeroingPolicy,
) -> Result<(), FreezeError> {
    tx.update_account_limits(&account.id, &policy.zeroed_account(&account.limits))
        .await
        .during("zero account limits")?;

    for project in projects {
        tx.update_project_limits(&project.id, &policy.zeroed(&project.limits))
            .await
            .during("zero project limits")?;
    }
    Ok(())
}

/// Write `snapshot` back verbatim. Projects deleted since the freeze are
/// skipped.
pub async fn restore<T: FreezeTx>(
    tx: &mut T,
    account_id: &AccountId,
    snapshot: &LimitSnapshot,
) -> Result<(), FreezeError> {
    for (project_id, limits) in &snapshot.projects {
        let found = tx
            .update_project_limits(project_id, limits)
            .await
            .during("restore project limits")?;
        if !found {
            tracing::debug!(account = %account_id, project = %project_id, "project gone; not restored");
        }
    }

    if snapshot.account.caps_zeroed() {
        tracing::debug!(account = %account_id, "zeroed account entry; account limits left as is");
        return Ok(());
    }
    tx.update_account_limits(account_id, &snapshot.account)
        .await
        .during("restore account limits")?;
    Ok(())
}
