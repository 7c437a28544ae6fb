//! # acct-cli: Operator CLI for Account Freezes
//!
//! Subcommand handlers for the `acct` binary. Each handler takes its clap
//! arguments and an [`acct_freeze::AccountFreezeService`] and returns the
//! JSON the binary prints, so handlers run the same against PostgreSQL or
//! the in-memory store.
//!
//! ## Subcommands
//!
//! - [`freeze`]: freeze, unfreeze, warn, unwarn, delay-bot, notify
//! - [`inspect`]: status, list
//! - [`sweep`]: escalation sweeps

pub mod freeze;
pub mod inspect;
pub mod settings;
pub mod sweep;
