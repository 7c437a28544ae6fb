//! Property tests for freeze/unfreeze round-trips through the service.

mod common;

use std::sync::Arc;

use proptest::prelude::*;

use acct_core::{AccountId, RateCaps, UsageLimits};
use acct_freeze::{
    Account, AccountFreezeService, AccountStatus, FreezeConfig, FreezeKind, MemoryStore,
    NoopTracker,
};

fn arb_cap() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![Just(None), Just(Some(0)), (1i64..1_000_000_000_000).prop_map(Some)]
}

fn arb_rate_caps() -> impl Strategy<Value = RateCaps> {
    (arb_cap(), arb_cap()).prop_map(|(rate, burst)| RateCaps::new(rate, burst))
}

prop_compose! {
    fn arb_limits()(
        caps in (arb_cap(), arb_cap(), arb_cap(), arb_cap(), arb_cap()),
        rates in proptest::array::uniform6(arb_rate_caps()),
    ) -> UsageLimits {
        let [aggregate, get, put, delete, head, list] = rates;
        UsageLimits {
            storage: caps.0,
            bandwidth: caps.1,
            segment: caps.2,
            user_set_storage: caps.3,
            user_set_bandwidth: caps.4,
            aggregate, get, put, delete, head, list,
        }
    }
}

fn arb_kind() -> impl Strategy<Value = FreezeKind> {
    prop_oneof![
        Just(FreezeKind::BillingFreeze),
        Just(FreezeKind::ViolationFreeze),
        Just(FreezeKind::LegalFreeze),
        Just(FreezeKind::BotFreeze),
        Just(FreezeKind::TrialExpirationFreeze),
    ]
}

/// Freeze and unfreeze `kind` on a fresh account, returning the account and
/// project limits afterwards.
async fn round_trip(
    kind: FreezeKind,
    account_limits: UsageLimits,
    project_limits: &[UsageLimits],
) -> (Account, Vec<UsageLimits>) {
    let store = MemoryStore::new();
    let id = AccountId::new();
    store
        .insert_account(Account::new(id, "prop@example.test", account_limits))
        .await;
    let mut projects = Vec::new();
    for limits in project_limits {
        projects.push(store.insert_project(id, *limits).await);
    }

    let svc = AccountFreezeService::new(store.clone(), Arc::new(NoopTracker), FreezeConfig::default())
        .expect("valid config")
        .with_clock(common::t0);
    svc.freeze(id, kind, true).await.expect("freeze");
    svc.unfreeze(id, kind, true).await.expect("unfreeze");

    let account = store.account(id).await.expect("account");
    let mut after = Vec::new();
    for project in projects {
        after.push(store.project(project).await.expect("project").limits);
    }
    (account, after)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn freeze_unfreeze_restores_every_limit(
        kind in arb_kind(),
        account_limits in arb_limits(),
        project_limits in proptest::collection::vec(arb_limits(), 0..4),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let (account, after) = rt.block_on(round_trip(kind, account_limits, &project_limits));

        prop_assert_eq!(account.limits, account_limits);
        prop_assert_eq!(account.status, AccountStatus::Active);
        prop_assert_eq!(after, project_limits);
    }
}
