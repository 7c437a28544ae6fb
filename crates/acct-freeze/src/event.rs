//! # Freeze Events
//!
//! One persisted row per (account, kind). The presence of an event for kind
//! K is what "the account is in state K" means; there is no separate flag.
//!
//! Listing pages over events in `(account_id, kind)` order. The cursor
//! remembers the last key returned so an account with several events is
//! never split across pages and partially skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use acct_core::{AccountId, LimitSnapshot, Timestamp};

use crate::kind::FreezeKind;

/// A persisted freeze event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeEvent {
    pub account_id: AccountId,
    pub kind: FreezeKind,
    /// Entitlements captured before zeroing. `None` for warnings and the
    /// delayed bot marker.
    pub limits: Option<LimitSnapshot>,
    /// Grace period in days, counted from `created_at`. `None` never
    /// escalates.
    pub days_till_escalation: Option<i64>,
    /// Reminder messages already sent for this event.
    pub notifications_count: i32,
    pub created_at: Timestamp,
}

impl FreezeEvent {
    /// A fresh event. The store keeps the original `created_at` if a row
    /// for the same (account, kind) already exists.
    pub fn new(
        account_id: AccountId,
        kind: FreezeKind,
        limits: Option<LimitSnapshot>,
        days_till_escalation: Option<i64>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            account_id,
            kind,
            limits,
            days_till_escalation,
            notifications_count: 0,
            created_at,
        }
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            account_id: self.account_id,
            kind: self.kind,
        }
    }
}

/// Primary key of a freeze event, also the listing sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub account_id: AccountId,
    pub kind: FreezeKind,
}

impl EventKey {
    /// Orders by account, then by persisted kind code. Matches the SQL
    /// `ORDER BY account_id, event` used by the database store.
    pub fn sort_tuple(&self) -> (AccountId, i16) {
        (self.account_id, self.kind.code())
    }
}

/// All live events for one account, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreezeEvents(BTreeMap<FreezeKind, FreezeEvent>);

impl FreezeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: FreezeKind) -> Option<&FreezeEvent> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: FreezeKind) -> bool {
        self.0.contains_key(&kind)
    }

    /// The first kind in `order` that has an event.
    pub fn first_of(&self, order: &[FreezeKind]) -> Option<&FreezeEvent> {
        order.iter().find_map(|k| self.0.get(k))
    }

    pub fn insert(&mut self, event: FreezeEvent) -> Option<FreezeEvent> {
        self.0.insert(event.kind, event)
    }

    pub fn kinds(&self) -> impl Iterator<Item = FreezeKind> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FreezeEvent> {
        self.0.values()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<FreezeEvent> for FreezeEvents {
    fn from_iter<I: IntoIterator<Item = FreezeEvent>>(iter: I) -> Self {
        Self(iter.into_iter().map(|e| (e.kind, e)).collect())
    }
}

/// Cursor for paging over all freeze events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeEventsCursor {
    /// Page size. Values below 1 are treated as 1.
    pub limit: usize,
    /// Resume strictly after this key. `None` starts from the beginning.
    pub starting_after: Option<EventKey>,
}

impl FreezeEventsCursor {
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            starting_after: None,
        }
    }

    /// Start after every event of `account_id`.
    pub fn after_account(limit: usize, account_id: AccountId) -> Self {
        // TrialExpirationFreeze carries the highest code, so this key sorts
        // after every event the account can have.
        Self {
            limit,
            starting_after: Some(EventKey {
                account_id,
                kind: FreezeKind::TrialExpirationFreeze,
            }),
        }
    }

    pub fn page_size(&self) -> usize {
        self.limit.max(1)
    }

    /// Whether `key` sorts strictly after this cursor.
    pub fn admits(&self, key: &EventKey) -> bool {
        match &self.starting_after {
            Some(after) => key.sort_tuple() > after.sort_tuple(),
            None => true,
        }
    }
}

/// One page of freeze events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeEventsPage {
    pub events: Vec<FreezeEvent>,
    /// Cursor for the following page, `None` when this was the last one.
    pub next: Option<FreezeEventsCursor>,
}

impl FreezeEventsPage {
    /// Build a page from up to `limit + 1` sorted rows: the extra row only
    /// signals that another page exists.
    pub fn from_overfetch(mut rows: Vec<FreezeEvent>, limit: usize) -> Self {
        let limit = limit.max(1);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next = match rows.last() {
            Some(last) if has_more => Some(FreezeEventsCursor {
                limit,
                starting_after: Some(last.key()),
            }),
            _ => None,
        };
        Self { events: rows, next }
    }
}
