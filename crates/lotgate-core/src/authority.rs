//! # Competency Tiers and Roles
//!
//! [`Tier`] is the integer competency level bound to an operator and the
//! minimum level bound to a vessel. [`Role`] names the grants held in the
//! role registry.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Competency level in `0..=5`.
///
/// Operators are certified at tiers 1 through 5. Tier 0 is the value of
/// every unset entry, both for operators (uncertified) and for vessel
/// requirements (no requirement), so registry lookups are total.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// The unset tier.
    pub const NONE: Tier = Tier(0);

    /// The highest tier.
    pub const MAX: Tier = Tier(5);

    /// Create a tier, rejecting values above [`Tier::MAX`].
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if level > Self::MAX.0 {
            return Err(ValidationError::TierOutOfRange(level));
        }
        Ok(Self(level))
    }

    /// The numeric level.
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Whether this is the unset tier.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Tier {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Roles granted through the role registry.
///
/// A principal may hold several roles at once. Roles are not ordered: a
/// manager is not implicitly a QC technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May schedule batches and record physical-witness overrides.
    Manager,
    /// May finalize batches after quality inspection.
    QcTech,
}

impl Role {
    /// Return the canonical role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "MANAGER",
            Self::QcTech => "QC_TECH",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANAGER" => Ok(Self::Manager),
            "QC_TECH" => Ok(Self::QcTech),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}
