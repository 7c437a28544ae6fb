//! Row types for SQLx mapping and their conversion into domain records.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use acct_core::{AccountId, LimitSnapshot, ProjectId, RateCaps, Timestamp, UsageLimits};
use acct_freeze::{Account, AccountStatus, FreezeEvent, FreezeKind, Project, StoreError};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub status: i16,
    pub storage_limit: Option<i64>,
    pub bandwidth_limit: Option<i64>,
    pub segment_limit: Option<i64>,
}

impl AccountRow {
    pub fn into_record(self) -> Result<Account, StoreError> {
        let status = AccountStatus::from_code(self.status).ok_or_else(|| StoreError::Corrupt {
            entity: "account",
            reason: format!("unknown status code {} for {}", self.status, self.id),
        })?;
        let limits = UsageLimits {
            storage: self.storage_limit,
            bandwidth: self.bandwidth_limit,
            segment: self.segment_limit,
            ..UsageLimits::default()
        };
        Ok(Account {
            id: AccountId(self.id),
            email: self.email,
            status,
            limits,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub storage_limit: Option<i64>,
    pub bandwidth_limit: Option<i64>,
    pub segment_limit: Option<i64>,
    pub user_specified_storage_limit: Option<i64>,
    pub user_specified_bandwidth_limit: Option<i64>,
    pub rate_limit: Option<i64>,
    pub burst_limit: Option<i64>,
    pub rate_limit_get: Option<i64>,
    pub burst_limit_get: Option<i64>,
    pub rate_limit_put: Option<i64>,
    pub burst_limit_put: Option<i64>,
    pub rate_limit_delete: Option<i64>,
    pub burst_limit_delete: Option<i64>,
    pub rate_limit_head: Option<i64>,
    pub burst_limit_head: Option<i64>,
    pub rate_limit_list: Option<i64>,
    pub burst_limit_list: Option<i64>,
}

impl ProjectRow {
    pub fn into_record(self) -> Project {
        Project {
            id: ProjectId(self.id),
            owner_id: AccountId(self.owner_id),
            limits: UsageLimits {
                storage: self.storage_limit,
                bandwidth: self.bandwidth_limit,
                segment: self.segment_limit,
                user_set_storage: self.user_specified_storage_limit,
                user_set_bandwidth: self.user_specified_bandwidth_limit,
                aggregate: RateCaps::new(self.rate_limit, self.burst_limit),
                get: RateCaps::new(self.rate_limit_get, self.burst_limit_get),
                put: RateCaps::new(self.rate_limit_put, self.burst_limit_put),
                delete: RateCaps::new(self.rate_limit_delete, self.burst_limit_delete),
                head: RateCaps::new(self.rate_limit_head, self.burst_limit_head),
                list: RateCaps::new(self.rate_limit_list, self.burst_limit_list),
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub account_id: Uuid,
    pub event: i16,
    pub limits: Option<serde_json::Value>,
    pub days_till_escalation: Option<i32>,
    pub notifications_count: i32,
    pub created_at: DateTime<Utc>,
}

impl EventRow {
    pub fn into_record(self) -> Result<FreezeEvent, StoreError> {
        let kind = FreezeKind::from_code(self.event).ok_or_else(|| StoreError::Corrupt {
            entity: "freeze event",
            reason: format!("unknown event code {} for account {}", self.event, self.account_id),
        })?;
        let limits = self
            .limits
            .map(LimitSnapshot::from_json)
            .transpose()
            .map_err(|e| StoreError::Corrupt {
                entity: "freeze event",
                reason: format!("limits of {kind} for account {}: {e}", self.account_id),
            })?;
        Ok(FreezeEvent {
            account_id: AccountId(self.account_id),
            kind,
            limits,
            days_till_escalation: self.days_till_escalation.map(i64::from),
            notifications_count: self.notifications_count,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

/// Encode the countdown for the `INTEGER` column.
pub(crate) fn days_column(days: Option<i64>) -> Result<Option<i32>, StoreError> {
    days.map(|d| {
        i32::try_from(d).map_err(|_| StoreError::Backend(format!("days_till_escalation {d} out of range")))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_row(event: i16, limits: Option<serde_json::Value>) -> EventRow {
        EventRow {
            account_id: Uuid::new_v4(),
            event,
            limits,
            days_till_escalation: Some(60),
            notifications_count: 2,
            created_at: DateTime::parse_from_rfc3339("2026-02-03T04:05:06Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_event_row_decodes_snapshot() {
        let snapshot = LimitSnapshot::for_account(UsageLimits::with_caps(1, 2, 3));
        let row = event_row(0, Some(snapshot.to_json().unwrap()));
        let event = row.into_record().unwrap();

        assert_eq!(event.kind, FreezeKind::BillingFreeze);
        assert_eq!(event.limits, Some(snapshot));
        assert_eq!(event.days_till_escalation, Some(60));
        assert_eq!(event.notifications_count, 2);
        assert_eq!(event.created_at, Timestamp::parse("2026-02-03T04:05:06Z").unwrap());
    }

    #[test]
    fn test_event_row_rejects_unknown_code() {
        let err = event_row(42, None).into_record().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { entity: "freeze event", .. }));
    }

    #[test]
    fn test_event_row_rejects_bad_snapshot() {
        let err = event_row(3, Some(serde_json::json!({"account": "nope"})))
            .into_record()
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_account_row_status() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            email: "a@example.test".into(),
            status: 5,
            storage_limit: Some(0),
            bandwidth_limit: None,
            segment_limit: Some(7),
        };
        let account = row.into_record().unwrap();
        assert_eq!(account.status, AccountStatus::PendingBotVerification);
        assert_eq!(account.limits.storage, Some(0));
        assert_eq!(account.limits.bandwidth, None);

        let bad = AccountRow {
            id: Uuid::new_v4(),
            email: String::new(),
            status: 99,
            storage_limit: None,
            bandwidth_limit: None,
            segment_limit: None,
        };
        assert!(bad.into_record().is_err());
    }

    #[test]
    fn test_days_column_range() {
        assert_eq!(days_column(None).unwrap(), None);
        assert_eq!(days_column(Some(60)).unwrap(), Some(60));
        assert!(days_column(Some(i64::MAX)).is_err());
    }
}
