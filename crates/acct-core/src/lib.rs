//! # acct-core: Foundational Types for Account Management
//!
//! The leaf of the workspace DAG. Every other `acct-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `AccountId` and `ProjectId` wrap
//!    a `Uuid` each, so an account can never be passed where a project is
//!    expected.
//!
//! 2. **Nullable-aware limits.** Every entitlement field in [`UsageLimits`]
//!    is an `Option`. `None` means "unset, use the platform default" and is
//!    a different value from `Some(0)`, which means "no allowance at all".
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!    Day arithmetic used by freeze escalation lives on the type.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `acct-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod limits;
pub mod temporal;

pub use error::CoreError;
pub use identity::{AccountId, ProjectId};
pub use limits::{LimitSnapshot, OpClass, RateCaps, UsageLimits};
pub use temporal::Timestamp;
