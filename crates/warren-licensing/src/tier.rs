//! Subscription tiers and entitlement limits.
//!
//! This table is the single source of truth for tier limits. Both the
//! license codec (which embeds the numbers in signed claims) and any
//! request-time quota check must go through [`Tier::limits`] so the two
//! can never disagree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LicenseError;

/// Sentinel for "unbounded" limits.
///
/// The value ends up inside a signed numeric claim, so a large sentinel
/// is used instead of a true infinity.
pub const UNLIMITED: u32 = 999_999;

/// Subscription tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Evaluation tier.
    Free,
    /// Paid tier for small teams.
    Pro,
    /// Unbounded tier.
    Enterprise,
}

impl Tier {
    /// Entitlement limits for this tier.
    pub fn limits(self) -> TierLimits {
        match self {
            Tier::Free => TierLimits {
                max_repos: 3,
                max_users: 1,
            },
            Tier::Pro => TierLimits {
                max_repos: 25,
                max_users: 10,
            },
            Tier::Enterprise => TierLimits {
                max_repos: UNLIMITED,
                max_users: UNLIMITED,
            },
        }
    }

    /// The wire label for this tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(LicenseError::InvalidTier(other.to_string())),
        }
    }
}

/// Numeric entitlement limits embedded in license claims.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierLimits {
    /// Maximum indexed repositories.
    pub max_repos: u32,
    /// Maximum seats.
    pub max_users: u32,
}

/// Limits for a raw tier label, failing closed.
///
/// Unknown or legacy labels yield the `free` limits rather than an error,
/// so a malformed tier string can never grant elevated access.
pub fn limits_for_tier(label: &str) -> TierLimits {
    label.parse::<Tier>().unwrap_or(Tier::Free).limits()
}
