//! Zeroing policies: which entitlement fields a freeze sets to zero.

use acct_core::{OpClass, RateCaps, UsageLimits};

use crate::config::{FreezeConfig, RateCeiling};
use crate::kind::FreezeKind;
use crate::rules::{rule_for, Zeroing};

/// Classes left at the ceiling during a trial-expiration freeze.
pub const CEILING_CLASSES: [OpClass; 3] = [OpClass::Head, OpClass::List, OpClass::Delete];

/// Concrete zeroing instructions for one freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroingPolicy {
    /// Zero all twelve rate/burst fields.
    pub zero_rate_and_burst: bool,
    /// After zeroing, raise head/list/delete to this ceiling.
    pub rate_ceiling: Option<RateCeiling>,
}

impl ZeroingPolicy {
    pub const CAPS_ONLY: ZeroingPolicy = ZeroingPolicy {
        zero_rate_and_burst: false,
        rate_ceiling: None,
    };

    pub const FULL: ZeroingPolicy = ZeroingPolicy {
        zero_rate_and_burst: true,
        rate_ceiling: None,
    };

    /// The policy `kind` applies, or `None` for kinds that never zero.
    pub fn for_kind(kind: FreezeKind, config: &FreezeConfig) -> Option<ZeroingPolicy> {
        match rule_for(kind).zeroing {
            Zeroing::None => None,
            Zeroing::CapsOnly => Some(Self::CAPS_ONLY),
            Zeroing::Full => Some(Self::FULL),
            Zeroing::TrialExpiration => Some(ZeroingPolicy {
                zero_rate_and_burst: true,
                rate_ceiling: Some(config.trial_rate_ceiling),
            }),
        }
    }

    /// Project entitlements after applying this policy to `live`.
    ///
    /// Capacity caps always become `Some(0)` and user-set overrides are
    /// cleared. Rate fields not covered by the policy keep their value.
    pub fn zeroed(&self, live: &UsageLimits) -> UsageLimits {
        let mut out = *live;
        out.zero_caps();
        if self.zero_rate_and_burst {
            out.zero_rates();
        }
        if let Some(ceiling) = self.rate_ceiling {
            for class in CEILING_CLASSES {
                *out.rate_caps_mut(class) = RateCaps::new(Some(ceiling.rate), Some(ceiling.burst));
            }
        }
        out
    }

    /// Account entitlements after zeroing. Only the capacity caps apply at
    /// the account level.
    pub fn zeroed_account(&self, live: &UsageLimits) -> UsageLimits {
        let mut out = *live;
        out.zero_caps();
        out
    }
}
