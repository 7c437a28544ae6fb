//! # Account Freeze Service
//!
//! The lifecycle operations. Each public operation is one transaction:
//!
//! ```text
//! begin ─▶ read account ─▶ read events ─▶ check precedence
//!       ─▶ capture + zero  (or restore)
//!       ─▶ upsert/delete events ─▶ status ─▶ sessions
//!       ─▶ commit ─▶ analytics notice
//! ```
//!
//! Any error before `commit` drops the transaction, so no partial state is
//! ever observable. Analytics notices go out only after a successful commit.
//!
//! Per-kind behaviour (blockers, donors, status moves, zeroing) comes from
//! [`crate::rules`]; nothing here branches on a specific freeze kind except
//! to route the warning and delayed-bot markers, which carry no snapshot.

use std::sync::Arc;

use acct_core::{AccountId, Timestamp};

use crate::account::{Account, AccountStatus};
use crate::config::FreezeConfig;
use crate::error::{FreezeError, StoreResultExt};
use crate::escalation;
use crate::event::{FreezeEvent, FreezeEvents, FreezeEventsCursor, FreezeEventsPage};
use crate::kind::FreezeKind;
use crate::policy::ZeroingPolicy;
use crate::reminder;
use crate::rules::{check_precedence, donor_for, rule_for, EscalationGrace, StatusChange};
use crate::snapshot::{apply_zeroing, capture, restore};
use crate::store::{FreezeStore, FreezeTx};
use crate::tracker::{FreezeAction, FreezeNotice, FreezeTracker};

/// Source of "now" for event creation.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Freeze lifecycle over a [`FreezeStore`].
pub struct AccountFreezeService<S> {
    store: S,
    tracker: Arc<dyn FreezeTracker>,
    config: FreezeConfig,
    clock: Clock,
}

impl<S: FreezeStore> AccountFreezeService<S> {
    /// Build a service. Rejects an invalid configuration.
    pub fn new(
        store: S,
        tracker: Arc<dyn FreezeTracker>,
        config: FreezeConfig,
    ) -> Result<Self, FreezeError> {
        config.validate()?;
        Ok(Self {
            store,
            tracker,
            config,
            clock: Arc::new(Timestamp::now),
        })
    }

    /// Replace the clock used to stamp new events.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &FreezeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }

    // ─── Queries ─────────────────────────────────────────────────────

    pub async fn is_frozen(&self, account: AccountId, kind: FreezeKind) -> Result<bool, FreezeError> {
        Ok(self.get(account, kind).await?.is_some())
    }

    pub async fn get(
        &self,
        account: AccountId,
        kind: FreezeKind,
    ) -> Result<Option<FreezeEvent>, FreezeError> {
        const OP: &str = "get freeze event";
        let mut tx = self.store.begin().await.during(OP)?;
        let event = tx.freeze_event(&account, kind).await.during(OP)?;
        tx.commit().await.during(OP)?;
        Ok(event)
    }

    /// Every live event for `account`; an absent kind means "not in that state".
    pub async fn get_all(&self, account: AccountId) -> Result<FreezeEvents, FreezeError> {
        const OP: &str = "get freeze events";
        let mut tx = self.store.begin().await.during(OP)?;
        let events = tx.freeze_events(&account).await.during(OP)?;
        tx.commit().await.during(OP)?;
        Ok(events)
    }

    /// One page of events across all accounts.
    pub async fn list_events(
        &self,
        cursor: &FreezeEventsCursor,
        kinds: Option<&[FreezeKind]>,
    ) -> Result<FreezeEventsPage, FreezeError> {
        const OP: &str = "list freeze events";
        let mut tx = self.store.begin().await.during(OP)?;
        let page = tx.list_freeze_events(cursor, kinds).await.during(OP)?;
        tx.commit().await.during(OP)?;
        Ok(page)
    }

    // ─── Freeze / Unfreeze ───────────────────────────────────────────

    /// Place `account` under `kind`.
    ///
    /// Re-freezing with a kind that is already present merges projects
    /// created since into the stored snapshot and leaves recorded entries
    /// untouched.
    pub async fn freeze(
        &self,
        account: AccountId,
        kind: FreezeKind,
        admin_initiated: bool,
    ) -> Result<(), FreezeError> {
        match kind {
            FreezeKind::BillingWarning => self.warn_as(account, admin_initiated).await,
            FreezeKind::DelayedBotFreeze => {
                self.delayed_bot_freeze(account, Some(self.config.delayed_bot_freeze_days))
                    .await
            }
            _ => self.freeze_with_snapshot(account, kind, admin_initiated).await,
        }
    }

    /// Lift `kind` from `account`, restoring the entitlements it captured.
    pub async fn unfreeze(
        &self,
        account: AccountId,
        kind: FreezeKind,
        admin_initiated: bool,
    ) -> Result<(), FreezeError> {
        const OP: &str = "unfreeze";
        let rule = rule_for(kind);
        let mut tx = self.store.begin().await.during(OP)?;

        let acct = load_account(&mut tx, account, OP).await?;
        let event = tx
            .freeze_event(&account, kind)
            .await
            .during(OP)?
            .ok_or(FreezeError::NoFreezeStatus { account, kind })?;

        if kind.takes_snapshot() {
            let snapshot = event
                .limits
                .as_ref()
                .ok_or(FreezeError::MissingSnapshot { account, kind })?;
            restore(&mut tx, &account, snapshot).await?;
        }

        tx.delete_freeze_event(&account, kind).await.during(OP)?;
        set_status(&mut tx, &acct, rule.status_on_unfreeze, OP).await?;
        tx.commit().await.during(OP)?;

        tracing::info!(account = %account, kind = %kind, admin_initiated, "freeze lifted");
        let action = match kind {
            FreezeKind::BillingWarning => FreezeAction::Unwarned,
            _ => FreezeAction::Unfrozen,
        };
        self.notify(&acct, kind, action, admin_initiated);
        Ok(())
    }

    /// Record a billing warning. A second warning is a no-op.
    pub async fn warn(&self, account: AccountId) -> Result<(), FreezeError> {
        self.warn_as(account, false).await
    }

    /// Remove the billing warning.
    pub async fn unwarn(&self, account: AccountId) -> Result<(), FreezeError> {
        self.unfreeze(account, FreezeKind::BillingWarning, false).await
    }

    /// Schedule bot review after `days`. `None` records the marker without
    /// a countdown, so the sweep never promotes it. Always overwrites an
    /// existing marker.
    pub async fn delayed_bot_freeze(
        &self,
        account: AccountId,
        days: Option<i64>,
    ) -> Result<(), FreezeError> {
        const OP: &str = "delayed bot freeze";
        let kind = FreezeKind::DelayedBotFreeze;
        let mut tx = self.store.begin().await.during(OP)?;

        let acct = load_account(&mut tx, account, OP).await?;
        let events = tx.freeze_events(&account).await.during(OP)?;
        check_precedence(account, kind, &events, acct.status)?;

        let event = FreezeEvent::new(account, kind, None, days, self.now());
        tx.upsert_freeze_event(&event).await.during(OP)?;
        tx.commit().await.during(OP)?;

        tracing::info!(account = %account, days = ?days, "bot review scheduled");
        Ok(())
    }

    async fn warn_as(&self, account: AccountId, admin_initiated: bool) -> Result<(), FreezeError> {
        const OP: &str = "warn";
        let kind = FreezeKind::BillingWarning;
        let mut tx = self.store.begin().await.during(OP)?;

        let acct = load_account(&mut tx, account, OP).await?;
        let events = tx.freeze_events(&account).await.during(OP)?;
        check_precedence(account, kind, &events, acct.status)?;
        if events.contains(kind) {
            tracing::debug!(account = %account, "already warned");
            return Ok(());
        }

        let event = FreezeEvent::new(account, kind, None, self.initial_days(kind), self.now());
        tx.upsert_freeze_event(&event).await.during(OP)?;
        tx.commit().await.during(OP)?;

        tracing::info!(account = %account, days = ?event.days_till_escalation, "account warned");
        self.notify(&acct, kind, FreezeAction::Warned, admin_initiated);
        Ok(())
    }

    async fn freeze_with_snapshot(
        &self,
        account: AccountId,
        kind: FreezeKind,
        admin_initiated: bool,
    ) -> Result<(), FreezeError> {
        const OP: &str = "freeze";
        let rule = rule_for(kind);
        let policy = ZeroingPolicy::for_kind(kind, &self.config).ok_or(
            FreezeError::UnsupportedKind {
                operation: OP,
                kind,
            },
        )?;
        let mut tx = self.store.begin().await.during(OP)?;

        let acct = load_account(&mut tx, account, OP).await?;
        let events = tx.freeze_events(&account).await.during(OP)?;
        check_precedence(account, kind, &events, acct.status)?;

        let existing = events.get(kind);
        let base = match existing {
            Some(event) => Some(
                event
                    .limits
                    .as_ref()
                    .ok_or(FreezeError::MissingSnapshot { account, kind })?,
            ),
            None => None,
        };
        let superseded = superseded_kinds(kind, &events);
        let carry_over: Vec<_> = superseded
            .iter()
            .filter_map(|k| events.get(*k).and_then(|e| e.limits.as_ref()))
            .collect();
        let overlapping = events.iter().any(|e| e.kind.takes_snapshot());

        let projects = tx.owned_projects(&account).await.during(OP)?;
        let (snapshot, stats) = capture(&acct, &projects, base, &carry_over, overlapping);
        tracing::debug!(
            account = %account,
            kind = %kind,
            recorded = stats.recorded,
            carried = stats.carried,
            skipped = stats.skipped,
            "limits captured"
        );

        let event = match existing {
            Some(event) => FreezeEvent {
                limits: Some(snapshot),
                ..event.clone()
            },
            None => FreezeEvent::new(
                account,
                kind,
                Some(snapshot),
                self.initial_days(kind),
                self.now(),
            ),
        };
        tx.upsert_freeze_event(&event).await.during(OP)?;
        apply_zeroing(&mut tx, &acct, &projects, policy).await?;

        for gone in superseded {
            tx.delete_freeze_event(&account, gone).await.during(OP)?;
            tracing::debug!(account = %account, kind = %kind, superseded = %gone, "event superseded");
        }

        set_status(&mut tx, &acct, rule.status_on_freeze, OP).await?;
        if rule.invalidates_sessions {
            let removed = tx.delete_sessions(&account).await.during(OP)?;
            tracing::debug!(account = %account, removed, "sessions invalidated");
        }
        tx.commit().await.during(OP)?;

        tracing::info!(
            account = %account,
            kind = %kind,
            admin_initiated,
            refreeze = existing.is_some(),
            "account frozen"
        );
        self.notify(&acct, kind, FreezeAction::Frozen, admin_initiated);
        Ok(())
    }

    // ─── Escalation ──────────────────────────────────────────────────

    /// Days left before `event` escalates, or `None` if it never does.
    pub fn days_till_escalation(&self, event: &FreezeEvent, now: Timestamp) -> Option<i64> {
        escalation::days_till_escalation(event, now, &self.config)
    }

    /// Whether `event` should escalate at `now`.
    ///
    /// A trial-expiration freeze additionally requires that the account is
    /// not already pending deletion and owns no project shared with another
    /// account.
    pub async fn should_escalate(&self, event: &FreezeEvent, now: Timestamp) -> Result<bool, FreezeError> {
        if !escalation::is_due(event, now, &self.config) {
            return Ok(false);
        }
        if event.kind != FreezeKind::TrialExpirationFreeze {
            return Ok(true);
        }

        const OP: &str = "should escalate";
        let mut tx = self.store.begin().await.during(OP)?;
        // A cleared countdown falls back to the configured grace, so the
        // status is what marks an escalated trial.
        let status = tx.account(&event.account_id).await.during(OP)?.map(|a| a.status);
        if matches!(status, None | Some(AccountStatus::PendingDeletion)) {
            return Ok(false);
        }
        let shared = tx.shared_project_count(&event.account_id).await.during(OP)?;
        tx.commit().await.during(OP)?;
        if shared > 0 {
            tracing::debug!(account = %event.account_id, shared, "shared projects block escalation");
        }
        Ok(shared == 0)
    }

    /// Mark the account for deletion and disable further escalation of the
    /// stored event.
    ///
    /// Only `event.kind` is used; the stored row is reread inside the
    /// transaction. Fails with [`FreezeError::EventVanished`] and changes
    /// nothing when the row was deleted concurrently.
    pub async fn escalate(&self, account: AccountId, event: &FreezeEvent) -> Result<(), FreezeError> {
        const OP: &str = "escalate";
        let kind = event.kind;
        let mut tx = self.store.begin().await.during(OP)?;

        let mut stored = tx
            .freeze_event(&account, kind)
            .await
            .during(OP)?
            .ok_or(FreezeError::EventVanished { account, kind })?;
        let acct = load_account(&mut tx, account, OP).await?;

        stored.days_till_escalation = None;
        tx.upsert_freeze_event(&stored).await.during(OP)?;
        tx.update_account_status(&account, AccountStatus::PendingDeletion)
            .await
            .during(OP)?;
        tx.commit().await.during(OP)?;

        tracing::info!(account = %account, kind = %kind, "freeze escalated to pending deletion");
        self.notify(&acct, kind, FreezeAction::Escalated, false);
        Ok(())
    }

    // ─── Notifications ───────────────────────────────────────────────

    /// Count one more reminder as sent.
    pub async fn increment_notification_count(
        &self,
        account: AccountId,
        kind: FreezeKind,
    ) -> Result<(), FreezeError> {
        const OP: &str = "increment notification count";
        let mut tx = self.store.begin().await.during(OP)?;
        if !tx.increment_notifications(&account, kind).await.during(OP)? {
            return Err(FreezeError::NoFreezeStatus { account, kind });
        }
        tx.commit().await.during(OP)?;
        Ok(())
    }

    /// Whether the next reminder for `event` is due at `now`.
    pub fn reminder_due(&self, event: &FreezeEvent, now: Timestamp) -> bool {
        reminder::reminder_due(event, now, &self.config)
    }

    // ─── Internals ───────────────────────────────────────────────────

    fn initial_days(&self, kind: FreezeKind) -> Option<i64> {
        match rule_for(kind).escalation_grace {
            EscalationGrace::Never => None,
            EscalationGrace::BillingWarn => Some(self.config.billing_warn_grace_days),
            EscalationGrace::BillingFreeze => Some(self.config.billing_freeze_grace_days),
            EscalationGrace::TrialExpiration => self
                .config
                .trial_escalation_enabled()
                .then_some(self.config.trial_expiration_grace_days),
            EscalationGrace::DelayedBot => Some(self.config.delayed_bot_freeze_days),
        }
    }

    fn notify(&self, account: &Account, kind: FreezeKind, action: FreezeAction, admin_initiated: bool) {
        self.tracker.track(&FreezeNotice {
            account_id: account.id,
            email: account.email.clone(),
            kind,
            action,
            admin_initiated,
        });
    }
}

/// Present events a freeze of `kind` deletes, donor first.
fn superseded_kinds(kind: FreezeKind, events: &FreezeEvents) -> Vec<FreezeKind> {
    let mut kinds: Vec<FreezeKind> = Vec::new();
    let candidates = donor_for(kind, events)
        .into_iter()
        .chain(rule_for(kind).also_deletes.iter().copied());
    for k in candidates {
        if k != kind && events.contains(k) && !kinds.contains(&k) {
            kinds.push(k);
        }
    }
    kinds
}

async fn load_account<T: FreezeTx>(
    tx: &mut T,
    id: AccountId,
    op: &'static str,
) -> Result<Account, FreezeError> {
    tx.account(&id)
        .await
        .during(op)?
        .ok_or(FreezeError::AccountNotFound(id))
}

async fn set_status<T: FreezeTx>(
    tx: &mut T,
    account: &Account,
    change: StatusChange,
    op: &'static str,
) -> Result<(), FreezeError> {
    match change.resolve(account.status) {
        Some(status) if status != account.status => {
            tx.update_account_status(&account.id, status).await.during(op)?;
            tracing::debug!(account = %account.id, from = %account.status, to = %status, "status changed");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::tracker::RecordingTracker;
    use acct_core::UsageLimits;

    async fn service() -> (AccountFreezeService<MemoryStore>, RecordingTracker, AccountId) {
        let store = MemoryStore::new();
        let id = AccountId::new();
        store
            .insert_account(Account::new(id, "owner@example.test", UsageLimits::with_caps(100, 200, 300)))
            .await;
        let tracker = RecordingTracker::new();
        let svc = AccountFreezeService::new(store, Arc::new(tracker.clone()), FreezeConfig::default())
            .unwrap()
            .with_clock(|| Timestamp::parse("2026-05-01T00:00:00Z").unwrap());
        (svc, tracker, id)
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let config = FreezeConfig {
            billing_freeze_grace_days: -5,
            ..FreezeConfig::default()
        };
        let result = AccountFreezeService::new(
            MemoryStore::new(),
            Arc::new(crate::tracker::NoopTracker),
            config,
        );
        assert!(matches!(result, Err(FreezeError::Config(_))));
    }

    #[tokio::test]
    async fn test_warn_is_idempotent_and_tracked_once() {
        let (svc, tracker, id) = service().await;
        svc.warn(id).await.unwrap();
        svc.warn(id).await.unwrap();

        let event = svc.get(id, FreezeKind::BillingWarning).await.unwrap().unwrap();
        assert_eq!(event.days_till_escalation, Some(15));
        assert!(event.limits.is_none());
        assert_eq!(
            tracker.actions(),
            vec![(FreezeKind::BillingWarning, FreezeAction::Warned)]
        );
    }

    #[tokio::test]
    async fn test_unwarn_without_warning() {
        let (svc, _, id) = service().await;
        let err = svc.unwarn(id).await.unwrap_err();
        assert!(matches!(err, FreezeError::NoFreezeStatus { kind: FreezeKind::BillingWarning, .. }));
    }

    #[tokio::test]
    async fn test_freeze_unknown_account() {
        let (svc, _, _) = service().await;
        let err = svc
            .freeze(AccountId::new(), FreezeKind::BillingFreeze, false)
            .await
            .unwrap_err();
        assert!(matches!(err, FreezeError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_billing_freeze_seeds_countdown() {
        let (svc, _, id) = service().await;
        svc.freeze(id, FreezeKind::BillingFreeze, false).await.unwrap();
        let event = svc.get(id, FreezeKind::BillingFreeze).await.unwrap().unwrap();
        assert_eq!(event.days_till_escalation, Some(60));
        assert_eq!(event.created_at, svc.now());
        assert!(svc.is_frozen(id, FreezeKind::BillingFreeze).await.unwrap());
    }

    #[tokio::test]
    async fn test_trial_countdown_absent_when_disabled() {
        let (svc, _, id) = service().await;
        svc.freeze(id, FreezeKind::TrialExpirationFreeze, false)
            .await
            .unwrap();
        let event = svc
            .get(id, FreezeKind::TrialExpirationFreeze)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.days_till_escalation, None);
    }

    #[tokio::test]
    async fn test_generic_delayed_bot_uses_config_delay() {
        let (svc, tracker, id) = service().await;
        svc.freeze(id, FreezeKind::DelayedBotFreeze, true).await.unwrap();
        let event = svc.get(id, FreezeKind::DelayedBotFreeze).await.unwrap().unwrap();
        assert_eq!(event.days_till_escalation, Some(3));
        assert!(tracker.notices().is_empty());

        svc.delayed_bot_freeze(id, Some(10)).await.unwrap();
        let event = svc.get(id, FreezeKind::DelayedBotFreeze).await.unwrap().unwrap();
        assert_eq!(event.days_till_escalation, Some(10));
    }

    #[tokio::test]
    async fn test_unfreeze_delayed_bot_removes_marker() {
        let (svc, _, id) = service().await;
        svc.delayed_bot_freeze(id, None).await.unwrap();
        svc.unfreeze(id, FreezeKind::DelayedBotFreeze, true).await.unwrap();
        assert!(!svc.is_frozen(id, FreezeKind::DelayedBotFreeze).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_notification_count() {
        let (svc, _, id) = service().await;
        svc.warn(id).await.unwrap();
        svc.increment_notification_count(id, FreezeKind::BillingWarning)
            .await
            .unwrap();
        let event = svc.get(id, FreezeKind::BillingWarning).await.unwrap().unwrap();
        assert_eq!(event.notifications_count, 1);

        let err = svc
            .increment_notification_count(id, FreezeKind::LegalFreeze)
            .await
            .unwrap_err();
        assert!(matches!(err, FreezeError::NoFreezeStatus { .. }));
    }

    #[tokio::test]
    async fn test_missing_snapshot_aborts_unfreeze() {
        let (svc, _, id) = service().await;
        svc.store()
            .put_event(FreezeEvent::new(id, FreezeKind::LegalFreeze, None, None, svc.now()))
            .await;
        let err = svc
            .unfreeze(id, FreezeKind::LegalFreeze, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FreezeError::MissingSnapshot { .. }));
        assert!(svc.is_frozen(id, FreezeKind::LegalFreeze).await.unwrap());
    }
}
