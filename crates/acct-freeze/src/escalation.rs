//! # Escalation Evaluator
//!
//! Time arithmetic for turning an aged freeze into pending deletion.
//!
//! An event is due once the whole days elapsed since its creation exceed
//! its `days_till_escalation`. Partial days never count. An event with no
//! countdown is never due, which is how an escalated event (countdown
//! cleared) stays permanently out of the sweep.
//!
//! Trial-expiration events additionally depend on configuration: a zero
//! trial grace period disables their escalation regardless of the stored
//! countdown, and an event frozen while escalation was disabled falls back
//! to the configured grace period once it is enabled. The shared-project
//! and already-escalated conditions need the store and live in the service.

use acct_core::Timestamp;

use crate::config::FreezeConfig;
use crate::event::FreezeEvent;
use crate::kind::FreezeKind;

/// The countdown that applies to `event` under `config`, or `None` when the
/// event never escalates.
pub fn effective_days(event: &FreezeEvent, config: &FreezeConfig) -> Option<i64> {
    if event.kind == FreezeKind::TrialExpirationFreeze {
        if !config.trial_escalation_enabled() {
            return None;
        }
        return event
            .days_till_escalation
            .or(Some(config.trial_expiration_grace_days));
    }
    event.days_till_escalation
}

/// Whole days since the event was created (never negative).
pub fn elapsed_days(event: &FreezeEvent, now: Timestamp) -> i64 {
    now.whole_days_since(event.created_at).max(0)
}

/// Days remaining before the event becomes due. Zero or negative once the
/// grace period has run out; `None` when it never escalates.
pub fn days_till_escalation(event: &FreezeEvent, now: Timestamp, config: &FreezeConfig) -> Option<i64> {
    effective_days(event, config).map(|days| days - elapsed_days(event, now))
}

/// Whether the time condition for escalation holds.
pub fn is_due(event: &FreezeEvent, now: Timestamp, config: &FreezeConfig) -> bool {
    effective_days(event, config).is_some_and(|days| elapsed_days(event, now) > days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acct_core::AccountId;

    fn event(kind: FreezeKind, days: Option<i64>) -> FreezeEvent {
        FreezeEvent::new(
            AccountId::new(),
            kind,
            None,
            days,
            Timestamp::parse("2026-01-01T12:00:00Z").unwrap(),
        )
    }

    fn at(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_due_only_after_grace_is_exceeded() {
        let config = FreezeConfig::default();
        let e = event(FreezeKind::BillingFreeze, Some(2));

        assert!(!is_due(&e, at("2026-01-03T12:00:00Z"), &config));
        // Three whole days have not elapsed until noon.
        assert!(!is_due(&e, at("2026-01-04T11:59:59Z"), &config));
        assert!(is_due(&e, at("2026-01-04T12:00:00Z"), &config));
    }

    #[test]
    fn test_days_till_escalation_counts_down() {
        let config = FreezeConfig::default();
        let e = event(FreezeKind::BillingWarning, Some(15));
        assert_eq!(days_till_escalation(&e, at("2026-01-01T12:00:00Z"), &config), Some(15));
        assert_eq!(days_till_escalation(&e, at("2026-01-11T13:00:00Z"), &config), Some(5));
        assert_eq!(days_till_escalation(&e, at("2026-01-20T12:00:00Z"), &config), Some(-4));
    }

    #[test]
    fn test_no_countdown_never_escalates() {
        let config = FreezeConfig::default();
        let e = event(FreezeKind::ViolationFreeze, None);
        assert!(!is_due(&e, at("2030-01-01T00:00:00Z"), &config));
        assert_eq!(days_till_escalation(&e, at("2030-01-01T00:00:00Z"), &config), None);
    }

    #[test]
    fn test_trial_disabled_by_zero_grace() {
        let e = event(FreezeKind::TrialExpirationFreeze, Some(1));
        let later = at("2026-03-01T00:00:00Z");

        assert!(!is_due(&e, later, &FreezeConfig::default()));
        let enabled = FreezeConfig {
            trial_expiration_grace_days: 30,
            ..FreezeConfig::default()
        };
        assert!(is_due(&e, later, &enabled));
    }

    #[test]
    fn test_trial_without_countdown_uses_configured_grace() {
        let e = event(FreezeKind::TrialExpirationFreeze, None);
        assert_eq!(effective_days(&e, &FreezeConfig::default()), None);

        let enabled = FreezeConfig {
            trial_expiration_grace_days: 7,
            ..FreezeConfig::default()
        };
        assert_eq!(effective_days(&e, &enabled), Some(7));
        assert_eq!(days_till_escalation(&e, at("2026-01-04T12:00:00Z"), &enabled), Some(4));
        assert!(!is_due(&e, at("2026-01-08T12:00:00Z"), &enabled));
        assert!(is_due(&e, at("2026-01-09T12:00:00Z"), &enabled));
    }

    #[test]
    fn test_clock_before_creation_is_not_due() {
        let e = event(FreezeKind::BillingFreeze, Some(0));
        assert!(!is_due(&e, at("2025-12-01T00:00:00Z"), &FreezeConfig::default()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use acct_core::AccountId;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn due_is_monotone_in_time(
            days in 0i64..400,
            first in 0i64..2_000,
            step in 0i64..2_000,
        ) {
            let config = FreezeConfig::default();
            let created = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
            let e = FreezeEvent::new(AccountId::new(), FreezeKind::BillingFreeze, None, Some(days), created);

            let t1 = created.plus_days(first);
            let t2 = t1.plus_days(step);
            prop_assert_eq!(is_due(&e, t1, &config), first > days);
            if is_due(&e, t1, &config) {
                prop_assert!(is_due(&e, t2, &config));
            }
        }

        #[test]
        fn cleared_countdown_is_never_due(elapsed in 0i64..10_000) {
            let config = FreezeConfig::default();
            let created = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
            let mut e = FreezeEvent::new(AccountId::new(), FreezeKind::BillingFreeze, None, Some(1), created);
            e.days_till_escalation = None;
            prop_assert!(!is_due(&e, created.plus_days(elapsed), &config));
        }
    }
}
