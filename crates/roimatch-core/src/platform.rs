//! Closed enumerations for publishing platforms and creator tiers.
//!
//! Both are validated at the ingestion boundary; the string forms are what
//! the predictive model sees as categorical values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    YouTube,
    TikTok,
    Facebook,
    Twitter,
}

impl Platform {
    /// Platforms enumerated by default when generating candidates.
    pub const CANDIDATES: [Platform; 4] = [
        Platform::Instagram,
        Platform::YouTube,
        Platform::TikTok,
        Platform::Facebook,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::YouTube),
            "tiktok" => Ok(Platform::TikTok),
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            _ => Err(CoreError::InvalidPlatform(s.to_string())),
        }
    }
}

/// Creator size tier, by audience reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Nano,
    Micro,
    Macro,
    Mega,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Nano, Tier::Micro, Tier::Macro, Tier::Mega];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Nano => "Nano",
            Tier::Micro => "Micro",
            Tier::Macro => "Macro",
            Tier::Mega => "Mega",
        }
    }

    /// Classify a follower count: under 10k is Nano, under 100k Micro,
    /// under 1M Macro, everything else Mega.
    #[must_use]
    pub fn from_followers(followers: u64) -> Self {
        match followers {
            0..10_000 => Tier::Nano,
            10_000..100_000 => Tier::Micro,
            100_000..1_000_000 => Tier::Macro,
            _ => Tier::Mega,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nano" => Ok(Tier::Nano),
            "micro" => Ok(Tier::Micro),
            "macro" => Ok(Tier::Macro),
            "mega" => Ok(Tier::Mega),
            _ => Err(CoreError::InvalidTier(s.to_string())),
        }
    }
}
