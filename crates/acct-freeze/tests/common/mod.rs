//! Shared fixture for the lifecycle integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use acct_core::{AccountId, ProjectId, RateCaps, Timestamp, UsageLimits};
use acct_freeze::{
    Account, AccountFreezeService, AccountStatus, FreezeConfig, MemoryStore, RecordingTracker,
};

/// Clock value used for every event the fixture creates.
pub fn t0() -> Timestamp {
    Timestamp::parse("2026-03-01T09:00:00Z").expect("valid timestamp")
}

pub fn day(n: i64) -> Timestamp {
    t0().plus_days(n)
}

pub fn account_limits() -> UsageLimits {
    UsageLimits::with_caps(25_000_000_000, 75_000_000_000, 10_000)
}

/// A project with custom caps and per-class rate limits.
pub fn tuned_project_limits() -> UsageLimits {
    UsageLimits {
        user_set_storage: Some(5_000_000_000),
        get: RateCaps::fixed(100),
        put: RateCaps::new(Some(50), None),
        list: RateCaps::fixed(10),
        ..UsageLimits::with_caps(10_000_000_000, 30_000_000_000, 5_000)
    }
}

pub struct Fixture {
    pub svc: AccountFreezeService<MemoryStore>,
    pub store: MemoryStore,
    pub tracker: RecordingTracker,
    pub account: AccountId,
    /// A project with explicit limits, then one on platform defaults.
    pub projects: [ProjectId; 2],
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(FreezeConfig::default()).await
    }

    pub async fn with_config(config: FreezeConfig) -> Self {
        let store = MemoryStore::new();
        let tracker = RecordingTracker::new();
        let account = seed_account(&store, AccountStatus::Active).await;
        let tuned = store.insert_project(account, tuned_project_limits()).await;
        let defaults = store.insert_project(account, UsageLimits::default()).await;

        let svc = AccountFreezeService::new(store.clone(), Arc::new(tracker.clone()), config)
            .expect("valid config")
            .with_clock(t0);

        Self {
            svc,
            store,
            tracker,
            account,
            projects: [tuned, defaults],
        }
    }

    pub async fn account(&self) -> Account {
        self.store.account(self.account).await.expect("account exists")
    }

    pub async fn project_limits(&self, index: usize) -> UsageLimits {
        self.store
            .project(self.projects[index])
            .await
            .expect("project exists")
            .limits
    }

    /// Assert every entitlement is back to its seeded value.
    pub async fn assert_original_limits(&self) {
        assert_eq!(self.account().await.limits, account_limits());
        assert_eq!(self.project_limits(0).await, tuned_project_limits());
        assert_eq!(self.project_limits(1).await, UsageLimits::default());
    }
}

pub async fn seed_account(store: &MemoryStore, status: AccountStatus) -> AccountId {
    let id = AccountId::new();
    let mut account = Account::new(id, format!("{}@example.test", id.as_uuid()), account_limits());
    account.status = status;
    store.insert_account(account).await;
    id
}
