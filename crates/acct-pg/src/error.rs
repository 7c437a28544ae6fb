//! Translation of `sqlx` failures into [`StoreError`].

use acct_freeze::StoreError;

/// PostgreSQL `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// PostgreSQL `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a database error. Serialization failures and deadlocks are
/// conflicts; pool and connection trouble is unavailability.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}
