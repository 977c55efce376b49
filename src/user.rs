use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, Utc};

pub type UserId = i64;

/// Weight accepted during onboarding, in kilograms.
pub const WEIGHT_RANGE_KG: RangeInclusive<u32> = 30..=200;
/// A single recorded drink, in millilitres.
pub const INTAKE_RANGE_ML: RangeInclusive<u32> = 50..=3000;
/// Manual daily goal override, in millilitres.
pub const GOAL_OVERRIDE_RANGE_ML: RangeInclusive<u32> = 500..=5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Unspecified,
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => anyhow::bail!("Unknown gender value: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ActivityLevel::Low),
            "medium" => Ok(ActivityLevel::Medium),
            "high" => Ok(ActivityLevel::High),
            other => anyhow::bail!("Unknown activity level value: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: UserId,
    pub gender: Gender,
    pub weight_kg: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
    /// None until onboarding completes. Once set, the profile counts as
    /// configured and onboarding is skipped on the next /start.
    pub daily_goal_ml: Option<u32>,
    pub timezone_offset_minutes: i32,
    pub language: Option<String>,
    pub notifications_enabled: bool,
}

impl UserProfile {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            gender: Gender::Unspecified,
            weight_kg: None,
            activity_level: None,
            daily_goal_ml: None,
            timezone_offset_minutes: 0,
            language: None,
            notifications_enabled: true,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.daily_goal_ml.is_some()
    }
}

/// Immutable once created. Only ever read in aggregate.
#[derive(Debug, Clone)]
pub struct IntakeRecord {
    pub user_id: UserId,
    pub amount_ml: u32,
    pub timestamp: DateTime<Utc>,
}
