//! # Live PostgreSQL Tests
//!
//! Runs the freeze lifecycle against a real database. Skipped unless
//! `ACCT_TEST_DATABASE_URL` points at a disposable PostgreSQL instance;
//! the tests create their own rows and never clean up other data.

use std::sync::Arc;

use acct_core::{AccountId, ProjectId, RateCaps, UsageLimits};
use acct_freeze::{
    AccountFreezeService, AccountStatus, FreezeConfig, FreezeKind, FreezeStore, FreezeTx,
    NoopTracker,
};
use acct_pg::{PgStore, PoolSettings};

async fn store() -> Option<PgStore> {
    let url = std::env::var("ACCT_TEST_DATABASE_URL").ok()?;
    Some(
        PgStore::connect(&PoolSettings::new(url))
            .await
            .expect("test database reachable"),
    )
}

async fn seed(store: &PgStore, limits: UsageLimits) -> (AccountId, ProjectId) {
    let account = AccountId::new();
    let project = ProjectId::new();
    sqlx::query(
        "INSERT INTO accounts (id, email, status, storage_limit, bandwidth_limit, segment_limit)
         VALUES ($1, $2, 1, 1000, 2000, 30)",
    )
    .bind(account.as_uuid())
    .bind(format!("{}@example.test", account.as_uuid()))
    .execute(store.pool())
    .await
    .expect("insert account");
    sqlx::query(
        "INSERT INTO projects (id, owner_id, storage_limit, bandwidth_limit, segment_limit,
                               rate_limit_get, burst_limit_get)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(project.as_uuid())
    .bind(account.as_uuid())
    .bind(limits.storage)
    .bind(limits.bandwidth)
    .bind(limits.segment)
    .bind(limits.get.rate)
    .bind(limits.get.burst)
    .execute(store.pool())
    .await
    .expect("insert project");
    sqlx::query("INSERT INTO webapp_sessions (id, account_id, expires_at) VALUES ($1, $2, now())")
        .bind(uuid::Uuid::new_v4())
        .bind(account.as_uuid())
        .execute(store.pool())
        .await
        .expect("insert session");
    (account, project)
}

async fn project_limits(store: &PgStore, owner: AccountId) -> Vec<UsageLimits> {
    let mut tx = store.begin().await.expect("begin");
    let projects = tx.owned_projects(&owner).await.expect("projects");
    tx.commit().await.expect("commit");
    projects.into_iter().map(|p| p.limits).collect()
}

#[tokio::test]
async fn test_legal_freeze_round_trip() {
    let Some(store) = store().await else {
        return;
    };
    let original = UsageLimits {
        get: RateCaps::fixed(40),
        ..UsageLimits::with_caps(100, 200, 300)
    };
    let (account, _) = seed(&store, original).await;
    let svc = AccountFreezeService::new(store.clone(), Arc::new(NoopTracker), FreezeConfig::default())
        .expect("config");

    svc.freeze(account, FreezeKind::LegalFreeze, true).await.expect("freeze");
    let frozen = project_limits(&store, account).await;
    assert!(frozen[0].caps_zeroed());
    assert!(frozen[0].rates_zeroed());

    let event = svc
        .get(account, FreezeKind::LegalFreeze)
        .await
        .expect("get")
        .expect("event");
    let snapshot = event.limits.expect("snapshot");
    assert_eq!(snapshot.account, UsageLimits::with_caps(1000, 2000, 30));

    let mut tx = store.begin().await.expect("begin");
    let acct = tx.account(&account).await.expect("account").expect("row");
    assert_eq!(acct.status, AccountStatus::LegalHold);
    assert_eq!(tx.delete_sessions(&account).await.expect("sessions"), 0);
    tx.commit().await.expect("commit");

    svc.unfreeze(account, FreezeKind::LegalFreeze, true).await.expect("unfreeze");
    assert_eq!(project_limits(&store, account).await, vec![original]);
}

#[tokio::test]
async fn test_upsert_keeps_created_at_and_counter() {
    let Some(store) = store().await else {
        return;
    };
    let (account, _) = seed(&store, UsageLimits::with_caps(1, 1, 1)).await;
    let svc = AccountFreezeService::new(store.clone(), Arc::new(NoopTracker), FreezeConfig::default())
        .expect("config");

    svc.warn(account).await.expect("warn");
    svc.increment_notification_count(account, FreezeKind::BillingWarning)
        .await
        .expect("increment");
    let first = svc
        .get(account, FreezeKind::BillingWarning)
        .await
        .expect("get")
        .expect("event");

    svc.delayed_bot_freeze(account, Some(9)).await.expect("delay");
    svc.delayed_bot_freeze(account, Some(2)).await.expect("delay again");
    let marker = svc
        .get(account, FreezeKind::DelayedBotFreeze)
        .await
        .expect("get")
        .expect("event");
    assert_eq!(marker.days_till_escalation, Some(2));

    let again = svc
        .get(account, FreezeKind::BillingWarning)
        .await
        .expect("get")
        .expect("event");
    assert_eq!(again.notifications_count, 1);
    assert_eq!(again.created_at, first.created_at);
}
