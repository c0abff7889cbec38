use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Service level offered by the studio.
///
/// Variant order is the recommendation rank: a higher tier always wins a fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Landing,
    Business,
    #[serde(alias = "advanced")]
    Custom,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Landing, Tier::Business, Tier::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Business => "business",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "landing" => Ok(Self::Landing),
            "business" => Ok(Self::Business),
            "custom" | "advanced" => Ok(Self::Custom),
            other => Err(DomainError::UnknownIdentifier {
                kind: "tier",
                value: other.to_string(),
            }),
        }
    }
}

/// System shape for custom builds; each carries its own starting range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformArchetype {
    Ecommerce,
    Membership,
    Elearning,
    Marketplace,
}

impl PlatformArchetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ecommerce => "ecommerce",
            Self::Membership => "membership",
            Self::Elearning => "elearning",
            Self::Marketplace => "marketplace",
        }
    }
}

impl FromStr for PlatformArchetype {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "ecommerce" => Ok(Self::Ecommerce),
            "membership" => Ok(Self::Membership),
            "elearning" => Ok(Self::Elearning),
            "marketplace" => Ok(Self::Marketplace),
            _ => Err(DomainError::UnknownIdentifier {
                kind: "platform",
                value: value.trim().to_string(),
            }),
        }
    }
}
