//! # acct-pg: PostgreSQL Freeze Store
//!
//! Implements [`acct_freeze::FreezeStore`] over PostgreSQL via SQLx.
//!
//! ## Tables
//!
//! - `accounts`: status and account-level capacity caps.
//! - `projects`: owner and the full set of project entitlements.
//! - `project_members`: who besides the owner works in a project.
//! - `webapp_sessions`: deleted when a legal or bot freeze lands.
//! - `account_freeze_events`: one row per (account, kind), with the limit
//!   snapshot as `JSONB`.
//!
//! Migrations live in `migrations/` and are embedded with
//! `sqlx::migrate!`; [`connect`] applies them on startup.
//!
//! ## Errors
//!
//! SQLSTATE `40001` and `40P01` surface as `StoreError::Conflict` so callers
//! can retry the whole operation. Undecodable rows surface as
//! `StoreError::Corrupt` instead of being patched over.

pub mod error;
pub mod pool;
mod rows;
pub mod store;

pub use error::store_error;
pub use pool::{connect, PoolSettings};
pub use store::{PgStore, PgTx};
