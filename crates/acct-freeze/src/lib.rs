//! # acct-freeze: Account Freeze State Machine
//!
//! Places accounts under restrictions (billing, violation, legal, bot,
//! trial expiration), lifts them, and escalates aged ones to pending
//! deletion.
//!
//! ## Model
//!
//! The state of an account is the set of its live [`FreezeEvent`]s, at most
//! one per [`FreezeKind`]. A freeze that restricts usage records the live
//! entitlements of the account and its owned projects in the event's
//! [`LimitSnapshot`](acct_core::LimitSnapshot), then zeroes them; unfreezing
//! writes the snapshot back.
//!
//! ## Layout
//!
//! - [`rules`]: the per-kind rule table and the precedence guard.
//! - [`snapshot`], [`policy`]: capture, zeroing, restore.
//! - [`service`]: the transactional lifecycle operations.
//! - [`escalation`], [`sweep`], [`reminder`]: time-driven behaviour.
//! - [`store`]: the unit-of-work contract; [`memory`] implements it in
//!   process, `acct-pg` over PostgreSQL.
//!
//! ## Crate Policy
//!
//! - Every lifecycle operation is a single transaction: all of its writes
//!   commit together or none do.
//! - Analytics notices are emitted only after commit.
//! - No `.unwrap()` outside tests.

pub mod account;
pub mod config;
pub mod error;
pub mod escalation;
pub mod event;
pub mod kind;
pub mod memory;
pub mod policy;
pub mod reminder;
pub mod rules;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod sweep;
pub mod tracker;

// ─── Re-exports ─────────────────────────────────────────────────────

pub use account::{Account, AccountStatus, Project};
pub use config::{FreezeConfig, RateCeiling};
pub use error::{FreezeError, PrecedenceBlocker, StoreError};
pub use event::{EventKey, FreezeEvent, FreezeEvents, FreezeEventsCursor, FreezeEventsPage};
pub use kind::FreezeKind;
pub use memory::{FaultPoint, MemoryStore, MemoryTx};
pub use policy::ZeroingPolicy;
pub use rules::{FreezeRule, StatusChange};
pub use service::{AccountFreezeService, Clock};
pub use store::{FreezeStore, FreezeTx};
pub use sweep::{SweepReport, SweepTarget};
pub use tracker::{FreezeAction, FreezeNotice, FreezeTracker, LogTracker, NoopTracker, RecordingTracker};
