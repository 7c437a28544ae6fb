//! Reminder scheduling for billing warnings and billing freezes.
//!
//! The first notice is sent when the event is created and bumps the
//! event's notification counter to one. After N notices, reminder N is due
//! once the event is older than the N-th configured threshold. When the
//! thresholds run out, no more reminders are sent.

use acct_core::Timestamp;

use crate::config::FreezeConfig;
use crate::event::FreezeEvent;
use crate::kind::FreezeKind;

/// Reminder thresholds (days since creation) for `kind`. Empty for kinds
/// that never send reminders.
pub fn schedule(kind: FreezeKind, config: &FreezeConfig) -> &[i64] {
    match kind {
        FreezeKind::BillingWarning => config.billing_warning_reminder_days.as_slice(),
        FreezeKind::BillingFreeze => config.billing_freeze_reminder_days.as_slice(),
        _ => &[],
    }
}

/// Whether the next reminder for `event` is due at `now`.
pub fn reminder_due(event: &FreezeEvent, now: Timestamp, config: &FreezeConfig) -> bool {
    let sent = match usize::try_from(event.notifications_count) {
        Ok(n) if n > 0 => n,
        _ => return false,
    };
    match schedule(event.kind, config).get(sent - 1) {
        Some(days) => chrono::Duration::try_days(*days)
            .is_some_and(|threshold| now.elapsed_since(event.created_at) > threshold),
        None => false,
    }
}
