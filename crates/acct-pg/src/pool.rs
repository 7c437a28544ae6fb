//! Connection pool setup.
//!
//! Settings come from the environment:
//!
//! - `DATABASE_URL` (required)
//! - `ACCT_DB_MAX_CONNECTIONS` (default 10)
//! - `ACCT_DB_ACQUIRE_TIMEOUT_SECS` (default 5)

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// How to reach the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }

    /// Read settings from the process environment. `None` when
    /// `DATABASE_URL` is unset.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`. Unparseable numbers fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty())?;
        let mut settings = Self::new(url);
        if let Some(n) = lookup("ACCT_DB_MAX_CONNECTIONS").and_then(|v| v.trim().parse().ok()) {
            settings.max_connections = n;
        }
        if let Some(secs) = lookup("ACCT_DB_ACQUIRE_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            settings.acquire_timeout = Duration::from_secs(secs);
        }
        Some(settings)
    }
}

/// Connect and apply the embedded migrations.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.url)
        .await?;
    tracing::info!(max_connections = settings.max_connections, "connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(pool)
}
