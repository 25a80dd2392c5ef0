use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CenusError;

/// Granularity of an advertising entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Level {
    Campaign,
    AdSet,
    Ad,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Campaign, Level::AdSet, Level::Ad];

    /// Lowercase key used on the command line and in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Campaign => "campaign",
            Level::AdSet => "adset",
            Level::Ad => "ad",
        }
    }

    /// Name of the observation field that identifies an entity at this level.
    pub fn id_field(&self) -> &'static str {
        match self {
            Level::Campaign => "campaign_id",
            Level::AdSet => "adset_id",
            Level::Ad => "ad_id",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Campaign => write!(f, "Campaign"),
            Level::AdSet => write!(f, "AdSet"),
            Level::Ad => write!(f, "Ad"),
        }
    }
}

impl FromStr for Level {
    type Err = CenusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "campaign" => Ok(Level::Campaign),
            "adset" | "ad_set" | "ad set" => Ok(Level::AdSet),
            "ad" => Ok(Level::Ad),
            _ => Err(CenusError::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = CenusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
