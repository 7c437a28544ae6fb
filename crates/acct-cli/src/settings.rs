//! # Settings
//!
//! Freeze configuration comes from an optional YAML file, then
//! `ACCT_FREEZE_*` environment overrides. The database connection comes
//! from `--database-url` or `DATABASE_URL`.

use std::path::Path;

use anyhow::{Context, Result};

use acct_freeze::FreezeConfig;
use acct_pg::PoolSettings;

/// Load the freeze configuration. Without a path the defaults apply before
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<FreezeConfig> {
    let base = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            FreezeConfig::from_yaml_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => FreezeConfig::default(),
    };
    let config = base.apply_env().context("invalid ACCT_FREEZE_* override")?;
    config.validate()?;
    Ok(config)
}

/// Resolve pool settings. An explicit URL wins over `DATABASE_URL`; the
/// pool tuning variables apply either way.
pub fn pool_settings(database_url: Option<&str>) -> Result<PoolSettings> {
    let from_env = PoolSettings::from_env();
    match (database_url, from_env) {
        (Some(url), Some(env)) => Ok(PoolSettings {
            url: url.to_string(),
            ..env
        }),
        (Some(url), None) => Ok(PoolSettings::new(url)),
        (None, Some(env)) => Ok(env),
        (None, None) => anyhow::bail!("no database configured: pass --database-url or set DATABASE_URL"),
    }
}
