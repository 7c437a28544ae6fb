//! # Sweep Subcommand
//!
//! `acct sweep --target billing-freeze [--at 2026-03-01T00:00:00Z]` runs one
//! escalation pass. `--target all` runs every target in turn. The process
//! exits with status 2 when any event failed to escalate.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use acct_core::Timestamp;
use acct_freeze::{AccountFreezeService, FreezeStore, SweepReport, SweepTarget};

use crate::inspect::parse_timestamp;

/// Which sweep to run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArg {
    TrialExpiration,
    BillingWarning,
    BillingFreeze,
    DelayedBot,
    All,
}

impl TargetArg {
    fn targets(self) -> &'static [SweepTarget] {
        match self {
            Self::TrialExpiration => &[SweepTarget::TrialExpiration],
            Self::BillingWarning => &[SweepTarget::BillingWarning],
            Self::BillingFreeze => &[SweepTarget::BillingFreeze],
            Self::DelayedBot => &[SweepTarget::DelayedBot],
            Self::All => &SweepTarget::ALL,
        }
    }
}

/// Arguments for `sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    #[arg(long, value_enum)]
    pub target: TargetArg,

    /// Events fetched per page.
    #[arg(long, default_value_t = 500)]
    pub page_size: usize,

    /// Evaluate escalation at this instant instead of now (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<Timestamp>,
}

pub async fn run_sweep<S: FreezeStore>(
    args: &SweepArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Vec<SweepReport>> {
    let now = args.at.unwrap_or_else(|| svc.now());
    let mut reports = Vec::new();
    for &target in args.target.targets() {
        let report = svc
            .sweep(target, now, args.page_size)
            .await
            .with_context(|| format!("{target} sweep aborted"))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Exit status for a finished sweep.
pub fn exit_code(reports: &[SweepReport]) -> u8 {
    if reports.iter().any(|r| r.failed > 0) {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use acct_core::{AccountId, UsageLimits};
    use acct_freeze::{Account, AccountStatus, FreezeConfig, FreezeKind, MemoryStore, NoopTracker};

    fn t0() -> Timestamp {
        Timestamp::parse("2026-03-01T09:00:00Z").unwrap()
    }

    #[test]
    fn test_all_expands_to_every_target() {
        assert_eq!(TargetArg::All.targets(), &SweepTarget::ALL);
        assert_eq!(TargetArg::DelayedBot.targets(), &[SweepTarget::DelayedBot]);
        assert_eq!(TargetArg::BillingWarning.targets(), &[SweepTarget::BillingWarning]);
    }

    #[tokio::test]
    async fn test_sweep_at_instant_escalates_billing() {
        let store = MemoryStore::new();
        let id = AccountId::new();
        store
            .insert_account(Account::new(id, "sweep@example.test", UsageLimits::with_caps(5, 5, 5)))
            .await;
        let svc = AccountFreezeService::new(store.clone(), Arc::new(NoopTracker), FreezeConfig::default())
            .unwrap()
            .with_clock(t0);
        svc.freeze(id, FreezeKind::BillingFreeze, false).await.unwrap();

        let early = SweepArgs {
            target: TargetArg::BillingFreeze,
            page_size: 10,
            at: Some(t0().plus_days(30)),
        };
        let reports = run_sweep(&early, &svc).await.unwrap();
        assert_eq!(reports[0].escalated, 0);
        assert_eq!(exit_code(&reports), 0);

        let late = SweepArgs {
            target: TargetArg::All,
            page_size: 10,
            at: Some(t0().plus_days(61)),
        };
        let reports = run_sweep(&late, &svc).await.unwrap();
        assert_eq!(reports.len(), SweepTarget::ALL.len());
        assert_eq!(reports.iter().map(|r| r.escalated).sum::<usize>(), 1);
        assert_eq!(
            store.account(id).await.unwrap().status,
            AccountStatus::PendingDeletion
        );
    }

    #[test]
    fn test_failures_set_exit_code() {
        let report = SweepReport {
            target: SweepTarget::BillingFreeze,
            examined: 3,
            escalated: 1,
            skipped: 1,
            failed: 1,
        };
        assert_eq!(exit_code(&[report]), 2);
    }
}
