//! # Freeze Subcommands
//!
//! Operator actions that change an account's freeze state:
//!
//! - `acct freeze --account ID --kind legal_freeze [--admin]`
//! - `acct unfreeze --account ID --kind legal_freeze [--admin]`
//! - `acct warn --account ID` / `acct unwarn --account ID`
//! - `acct delay-bot --account ID [--days N | --no-deadline]`
//! - `acct notify --account ID --kind billing_freeze`
//!
//! Each handler prints the account's events after the change.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use acct_core::AccountId;
use acct_freeze::config::MAX_DAYS;
use acct_freeze::{AccountFreezeService, FreezeKind, FreezeStore};

use crate::inspect::events_view;

/// Arguments for `freeze` and `unfreeze`.
#[derive(Args, Debug)]
pub struct FreezeArgs {
    /// Account to act on (`<uuid>` or `account:<uuid>`).
    #[arg(long)]
    pub account: AccountId,

    /// Freeze kind, by name (`billing_freeze`) or numeric code.
    #[arg(long)]
    pub kind: FreezeKind,

    /// Mark the action as taken by an administrator.
    #[arg(long)]
    pub admin: bool,
}

/// Arguments naming just an account.
#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(long)]
    pub account: AccountId,
}

/// Arguments for `delay-bot`.
#[derive(Args, Debug)]
pub struct DelayBotArgs {
    #[arg(long)]
    pub account: AccountId,

    /// Days until the marker is promoted to a bot freeze. Defaults to the
    /// configured delay.
    #[arg(long, conflicts_with = "no_deadline")]
    pub days: Option<i64>,

    /// Record the marker without a countdown.
    #[arg(long)]
    pub no_deadline: bool,
}

/// Arguments for `notify`.
#[derive(Args, Debug)]
pub struct NotifyArgs {
    #[arg(long)]
    pub account: AccountId,

    #[arg(long)]
    pub kind: FreezeKind,
}

pub async fn run_freeze<S: FreezeStore>(
    args: &FreezeArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    svc.freeze(args.account, args.kind, args.admin)
        .await
        .with_context(|| format!("failed to freeze {} as {}", args.account, args.kind))?;
    events_view(svc, args.account, svc.now()).await
}

pub async fn run_unfreeze<S: FreezeStore>(
    args: &FreezeArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    svc.unfreeze(args.account, args.kind, args.admin)
        .await
        .with_context(|| format!("failed to lift {} from {}", args.kind, args.account))?;
    events_view(svc, args.account, svc.now()).await
}

pub async fn run_warn<S: FreezeStore>(args: &AccountArgs, svc: &AccountFreezeService<S>) -> Result<Value> {
    svc.warn(args.account)
        .await
        .with_context(|| format!("failed to warn {}", args.account))?;
    events_view(svc, args.account, svc.now()).await
}

pub async fn run_unwarn<S: FreezeStore>(
    args: &AccountArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    svc.unwarn(args.account)
        .await
        .with_context(|| format!("failed to remove the warning from {}", args.account))?;
    events_view(svc, args.account, svc.now()).await
}

pub async fn run_delay_bot<S: FreezeStore>(
    args: &DelayBotArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    let days = if args.no_deadline {
        None
    } else {
        Some(args.days.unwrap_or(svc.config().delayed_bot_freeze_days))
    };
    if let Some(d) = days {
        anyhow::ensure!((0..=MAX_DAYS).contains(&d), "--days must be in 0..={MAX_DAYS}, got {d}");
    }
    svc.delayed_bot_freeze(args.account, days)
        .await
        .with_context(|| format!("failed to schedule bot review for {}", args.account))?;
    events_view(svc, args.account, svc.now()).await
}

/// Record one sent reminder and report whether another is due.
pub async fn run_notify<S: FreezeStore>(
    args: &NotifyArgs,
    svc: &AccountFreezeService<S>,
) -> Result<Value> {
    svc.increment_notification_count(args.account, args.kind)
        .await
        .with_context(|| format!("failed to count a reminder for {} on {}", args.kind, args.account))?;
    let event = svc
        .get(args.account, args.kind)
        .await?
        .with_context(|| format!("{} vanished from {}", args.kind, args.account))?;
    Ok(json!({
        "account_id": args.account,
        "kind": args.kind,
        "notifications_count": event.notifications_count,
        "reminder_due": svc.reminder_due(&event, svc.now()),
    }))
}
