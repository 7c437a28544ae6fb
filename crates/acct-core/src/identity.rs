//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers the freeze machinery handles.
//! You cannot pass a `ProjectId` where an `AccountId` is expected.
//!
//! Both types are `#[serde(transparent)]`, so they serialize as a bare UUID
//! string and can be used as JSON map keys (the per-project limit snapshot
//! is keyed by `ProjectId`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

/// Unique identifier for a project owned by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub Uuid);

impl AccountId {
    /// Generate a new random account identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The smallest identifier; every real account sorts after it.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl ProjectId {
    /// Generate a new random project identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    /// Parse either a bare UUID or the `account:<uuid>` display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("account:").unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| CoreError::Validation(format!("invalid account id {s:?}: {e}")))
    }
}

impl FromStr for ProjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("project:").unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| CoreError::Validation(format!("invalid project id {s:?}: {e}")))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account:{}", self.0)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "project:{}", self.0)
    }
}
