//! # Limit Snapshot Model
//!
//! Value types for an account's and its projects' resource entitlements.
//!
//! ## Null Semantics
//!
//! Every field is an `Option<i64>`. `None` means "unset, the platform
//! default applies"; `Some(0)` means "explicitly zero". The two are never
//! conflated: restoring a snapshot writes `None` back as `None`, and only
//! `Some(0)` caps count as the zeroed signature a freeze leaves behind.
//!
//! ## Operation Classes
//!
//! Rate and burst caps come in six pairs, one per [`OpClass`]. The
//! aggregate pair applies to all requests; the others narrow a single
//! operation family.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::ProjectId;

/// Request classes that carry their own rate and burst cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpClass {
    /// Every request, regardless of operation.
    Aggregate,
    /// Object downloads.
    Get,
    /// Object uploads.
    Put,
    /// Object deletion.
    Delete,
    /// Object metadata reads.
    Head,
    /// Bucket and object listing.
    List,
}

impl OpClass {
    /// All six classes in storage order.
    pub const ALL: [OpClass; 6] = [
        Self::Aggregate,
        Self::Get,
        Self::Put,
        Self::Delete,
        Self::Head,
        Self::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Get => "get",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for OpClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OpClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown operation class: {s:?}")))
    }
}

/// Rate (requests per second) and burst cap for one [`OpClass`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCaps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<i64>,
}

impl RateCaps {
    /// Both halves explicitly zero.
    pub const ZERO: RateCaps = RateCaps {
        rate: Some(0),
        burst: Some(0),
    };

    pub fn new(rate: Option<i64>, burst: Option<i64>) -> Self {
        Self { rate, burst }
    }

    /// Both rate and burst set to `value`.
    pub fn fixed(value: i64) -> Self {
        Self {
            rate: Some(value),
            burst: Some(value),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.rate.is_none() && self.burst.is_none()
    }
}

/// Resource entitlements of an account or a project.
///
/// The account row only uses the three capacity caps; projects use every
/// field. Both share this shape so a snapshot restores either verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLimits {
    /// Stored-bytes cap.
    pub storage: Option<i64>,
    /// Egress-bytes cap per billing period.
    pub bandwidth: Option<i64>,
    /// Segment-count cap.
    pub segment: Option<i64>,
    /// Storage cap the user lowered below the platform cap.
    pub user_set_storage: Option<i64>,
    /// Bandwidth cap the user lowered below the platform cap.
    pub user_set_bandwidth: Option<i64>,
    pub aggregate: RateCaps,
    pub get: RateCaps,
    pub put: RateCaps,
    pub delete: RateCaps,
    pub head: RateCaps,
    pub list: RateCaps,
}

impl UsageLimits {
    /// Limits with only the three capacity caps set.
    pub fn with_caps(storage: i64, bandwidth: i64, segment: i64) -> Self {
        Self {
            storage: Some(storage),
            bandwidth: Some(bandwidth),
            segment: Some(segment),
            ..Self::default()
        }
    }

    /// True when storage, bandwidth and segment are exactly `Some(0)` and
    /// no user-set override remains.
    ///
    /// This is the signature a zeroing freeze leaves behind, so a value
    /// matching it must not be recorded as an original entitlement.
    pub fn caps_zeroed(&self) -> bool {
        self.storage == Some(0)
            && self.bandwidth == Some(0)
            && self.segment == Some(0)
            && self.user_set_storage.is_none()
            && self.user_set_bandwidth.is_none()
    }

    /// True when every rate and burst cap is exactly `Some(0)`.
    pub fn rates_zeroed(&self) -> bool {
        OpClass::ALL
            .into_iter()
            .all(|class| self.rate_caps(class) == RateCaps::ZERO)
    }

    pub fn rate_caps(&self, class: OpClass) -> RateCaps {
        match class {
            OpClass::Aggregate => self.aggregate,
            OpClass::Get => self.get,
            OpClass::Put => self.put,
            OpClass::Delete => self.delete,
            OpClass::Head => self.head,
            OpClass::List => self.list,
        }
    }

    pub fn rate_caps_mut(&mut self, class: OpClass) -> &mut RateCaps {
        match class {
            OpClass::Aggregate => &mut self.aggregate,
            OpClass::Get => &mut self.get,
            OpClass::Put => &mut self.put,
            OpClass::Delete => &mut self.delete,
            OpClass::Head => &mut self.head,
            OpClass::List => &mut self.list,
        }
    }

    /// Set the capacity caps to `Some(0)` and drop both user-set overrides.
    /// Rate and burst caps are left alone.
    pub fn zero_caps(&mut self) {
        self.storage = Some(0);
        self.bandwidth = Some(0);
        self.segment = Some(0);
        self.user_set_storage = None;
        self.user_set_bandwidth = None;
    }

    /// Set all twelve rate and burst fields to `Some(0)`.
    pub fn zero_rates(&mut self) {
        for class in OpClass::ALL {
            *self.rate_caps_mut(class) = RateCaps::ZERO;
        }
    }
}

/// Entitlements captured before a freeze zeroed them.
///
/// Serialized as JSON into the freeze event's `limits` column. Project
/// entries are keyed by id; a `BTreeMap` keeps the encoding stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSnapshot {
    pub account: UsageLimits,
    #[serde(default)]
    pub projects: BTreeMap<ProjectId, UsageLimits>,
}

impl LimitSnapshot {
    /// A snapshot of the account alone, with no project entries yet.
    pub fn for_account(account: UsageLimits) -> Self {
        Self {
            account,
            projects: BTreeMap::new(),
        }
    }

    pub fn project(&self, id: &ProjectId) -> Option<&UsageLimits> {
        self.projects.get(id)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value)?)
    }
}
