//! # Inspection Subcommands
//!
//! Read-only views of freeze state: `status` for one account and `list`
//! for a page of events across all accounts.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use acct_core::{AccountId, Timestamp};
use acct_freeze::{AccountFreezeService, FreezeEventsCursor, FreezeKind, FreezeStore};

/// Arguments for `status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(long)]
    pub account: AccountId,

    /// Evaluate countdowns and reminders at this instant (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<Timestamp>,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page size.
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Start after every event of this account.
    #[arg(long)]
    pub after: Option<AccountId>,

    /// Only these kinds. Repeatable.
    #[arg(long = "kind")]
    pub kinds: Vec<FreezeKind>,
}

pub(crate) fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Every event of `account` with its countdown and reminder state at `now`.
pub async fn events_view<S: FreezeStore>(
    svc: &AccountFreezeService<S>,
    account: AccountId,
    now: Timestamp,
) -> Result<Value> {
    let events = svc
        .get_all(account)
        .await
        .with_context(|| format!("failed to load freeze events of {account}"))?;
    let rows: Vec<Value> = events
        .iter()
        .map(|event| {
            json!({
                "kind": event.kind,
                "created_at": event.created_at,
                "days_till_escalation": event.days_till_escalation,
                "days_remaining": svc.days_till_escalation(event, now),
                "notifications_count": event.notifications_count,
                "reminder_due": svc.reminder_due(event, now),
                "has_snapshot": event.limits.is_some(),
            })
        })
        .collect();
    Ok(json!({ "account_id": account, "events": rows }))
}

pub async fn run_status<S: FreezeStore>(
    args: &StatusArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    let now = args.at.unwrap_or_else(|| svc.now());
    events_view(svc, args.account, now).await
}

pub async fn run_list<S: FreezeStore>(args: &ListArgs, svc: &AccountFreezeService<S>) -> Result<Value> {
    let cursor = match args.after {
        Some(account) => FreezeEventsCursor::after_account(args.limit, account),
        None => FreezeEventsCursor::first(args.limit),
    };
    let kinds = (!args.kinds.is_empty()).then_some(args.kinds.as_slice());
    let page = svc
        .list_events(&cursor, kinds)
        .await
        .context("failed to list freeze events")?;
    Ok(serde_json::to_value(page)?)
}
