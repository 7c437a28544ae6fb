//! [`FreezeStore`] over PostgreSQL.
//!
//! Every transaction runs at `SERIALIZABLE`. Rows the lifecycle is about to
//! rewrite (the account, its projects, its freeze events) are read with
//! `FOR UPDATE` so two operations on the same account queue up on the row
//! locks instead of failing late with a serialization error.

use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;

use acct_core::{AccountId, ProjectId, UsageLimits};
use acct_freeze::{
    Account, AccountStatus, FreezeEvent, FreezeEvents, FreezeEventsCursor, FreezeEventsPage,
    FreezeKind, FreezeStore, FreezeTx, Project, StoreError,
};

use crate::error::store_error;
use crate::pool::{self, PoolSettings};
use crate::rows::{days_column, AccountRow, EventRow, ProjectRow};

/// Freeze store backed by a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with `settings` and apply migrations.
    pub async fn connect(settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = pool::connect(settings).await.map_err(store_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl FreezeStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        Ok(PgTx { tx })
    }
}

/// One serializable transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl FreezeTx for PgTx {
    // ─── Accounts ────────────────────────────────────────────────────

    async fn account(&mut self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, status, storage_limit, bandwidth_limit, segment_limit
             FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;

        row.map(AccountRow::into_record).transpose()
    }

    async fn update_account_status(
        &mut self,
        id: &AccountId,
        status: AccountStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET status = $1 WHERE id = $2")
            .bind(status.code())
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        expect_account(result.rows_affected(), id)
    }

    /// Only the capacity caps are stored at the account level.
    async fn update_account_limits(
        &mut self,
        id: &AccountId,
        limits: &UsageLimits,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE accounts SET storage_limit = $1, bandwidth_limit = $2, segment_limit = $3
             WHERE id = $4",
        )
        .bind(limits.storage)
        .bind(limits.bandwidth)
        .bind(limits.segment)
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        expect_account(result.rows_affected(), id)
    }

    // ─── Projects ────────────────────────────────────────────────────

    async fn owned_projects(&mut self, owner: &AccountId) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, owner_id, storage_limit, bandwidth_limit, segment_limit,
                    user_specified_storage_limit, user_specified_bandwidth_limit,
                    rate_limit, burst_limit, rate_limit_get, burst_limit_get,
                    rate_limit_put, burst_limit_put, rate_limit_delete, burst_limit_delete,
                    rate_limit_head, burst_limit_head, rate_limit_list, burst_limit_list
             FROM projects WHERE owner_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(owner.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(ProjectRow::into_record).collect())
    }

    async fn update_project_limits(
        &mut self,
        id: &ProjectId,
        limits: &UsageLimits,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE projects SET
                storage_limit = $1, bandwidth_limit = $2, segment_limit = $3,
                user_specified_storage_limit = $4, user_specified_bandwidth_limit = $5,
                rate_limit = $6, burst_limit = $7,
                rate_limit_get = $8, burst_limit_get = $9,
                rate_limit_put = $10, burst_limit_put = $11,
                rate_limit_delete = $12, burst_limit_delete = $13,
                rate_limit_head = $14, burst_limit_head = $15,
                rate_limit_list = $16, burst_limit_list = $17
             WHERE id = $18",
        )
        .bind(limits.storage)
        .bind(limits.bandwidth)
        .bind(limits.segment)
        .bind(limits.user_set_storage)
        .bind(limits.user_set_bandwidth)
        .bind(limits.aggregate.rate)
        .bind(limits.aggregate.burst)
        .bind(limits.get.rate)
        .bind(limits.get.burst)
        .bind(limits.put.rate)
        .bind(limits.put.burst)
        .bind(limits.delete.rate)
        .bind(limits.delete.burst)
        .bind(limits.head.rate)
        .bind(limits.head.burst)
        .bind(limits.list.rate)
        .bind(limits.list.burst)
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn shared_project_count(&mut self, owner: &AccountId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT p.id)
             FROM projects p
             JOIN project_members m ON m.project_id = p.id
             WHERE p.owner_id = $1 AND m.member_id <> $1",
        )
        .bind(owner.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    // ─── Sessions ────────────────────────────────────────────────────

    async fn delete_sessions(&mut self, account: &AccountId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM webapp_sessions WHERE account_id = $1")
            .bind(account.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    // ─── Freeze Events ───────────────────────────────────────────────

    async fn freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<Option<FreezeEvent>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT account_id, event, limits, days_till_escalation, notifications_count, created_at
             FROM account_freeze_events WHERE account_id = $1 AND event = $2 FOR UPDATE",
        )
        .bind(account.as_uuid())
        .bind(kind.code())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;

        row.map(EventRow::into_record).transpose()
    }

    async fn freeze_events(&mut self, account: &AccountId) -> Result<FreezeEvents, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT account_id, event, limits, days_till_escalation, notifications_count, created_at
             FROM account_freeze_events WHERE account_id = $1 ORDER BY event FOR UPDATE",
        )
        .bind(account.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(EventRow::into_record).collect()
    }

    async fn upsert_freeze_event(&mut self, event: &FreezeEvent) -> Result<FreezeEvent, StoreError> {
        let limits = event
            .limits
            .as_ref()
            .map(|l| l.to_json())
            .transpose()
            .map_err(|e| StoreError::Backend(format!("failed to serialize freeze limits: {e}")))?;

        let row = sqlx::query_as::<_, EventRow>(
            "INSERT INTO account_freeze_events
                (account_id, event, limits, days_till_escalation, notifications_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (account_id, event) DO UPDATE SET
                limits = EXCLUDED.limits,
                days_till_escalation = EXCLUDED.days_till_escalation,
                notifications_count = EXCLUDED.notifications_count
             RETURNING account_id, event, limits, days_till_escalation, notifications_count, created_at",
        )
        .bind(event.account_id.as_uuid())
        .bind(event.kind.code())
        .bind(limits)
        .bind(days_column(event.days_till_escalation)?)
        .bind(event.notifications_count)
        .bind(event.created_at.as_datetime())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;

        row.into_record()
    }

    async fn delete_freeze_event(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM account_freeze_events WHERE account_id = $1 AND event = $2")
            .bind(account.as_uuid())
            .bind(kind.code())
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_freeze_events(
        &mut self,
        cursor: &FreezeEventsCursor,
        kinds: Option<&[FreezeKind]>,
    ) -> Result<FreezeEventsPage, StoreError> {
        let limit = cursor.page_size();
        let (after_account, after_event) = match &cursor.starting_after {
            Some(key) => (Some(*key.account_id.as_uuid()), Some(key.kind.code())),
            None => (None, None),
        };
        let codes: Option<Vec<i16>> = kinds.map(|ks| ks.iter().map(|k| k.code()).collect());

        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT account_id, event, limits, days_till_escalation, notifications_count, created_at
             FROM account_freeze_events
             WHERE ($1::uuid IS NULL OR (account_id, event) > ($1::uuid, $2::smallint))
               AND ($3::smallint[] IS NULL OR event = ANY($3))
             ORDER BY account_id, event
             LIMIT $4",
        )
        .bind(after_account)
        .bind(after_event)
        .bind(codes)
        .bind(i64::try_from(limit + 1).unwrap_or(i64::MAX))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(store_error)?;

        let events = rows
            .into_iter()
            .map(EventRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FreezeEventsPage::from_overfetch(events, limit))
    }

    async fn increment_notifications(
        &mut self,
        account: &AccountId,
        kind: FreezeKind,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE account_freeze_events SET notifications_count = notifications_count + 1
             WHERE account_id = $1 AND event = $2",
        )
        .bind(account.as_uuid())
        .bind(kind.code())
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}

fn expect_account(rows_affected: u64, id: &AccountId) -> Result<(), StoreError> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_account_row_is_not_found() {
        let id = AccountId::new();
        let err = expect_account(0, &id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "account", .. }));
        assert!(expect_account(1, &id).is_ok());
    }
}
