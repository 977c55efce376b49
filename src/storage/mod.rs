mod memory;

pub use memory::InMemoryUserStorage;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::user::{ActivityLevel, Gender, UserId, UserProfile};

/// Partial profile write. Unset fields keep their current value; applying
/// an update to an unknown user creates a stub profile first, so e.g. a
/// language change before onboarding still sticks.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub gender: Option<Gender>,
    pub weight_kg: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
    pub daily_goal_ml: Option<u32>,
    pub timezone_offset_minutes: Option<i32>,
    pub language: Option<String>,
    pub notifications_enabled: Option<bool>,
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get_profile(&self, user_id: UserId) -> anyhow::Result<Option<UserProfile>>;

    async fn apply_profile_update(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> anyhow::Result<UserProfile>;

    async fn append_intake(
        &self,
        user_id: UserId,
        amount_ml: u32,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Total millilitres recorded on the current UTC day.
    async fn sum_intake_today(&self, user_id: UserId, now_utc: DateTime<Utc>)
    -> anyhow::Result<u32>;

    /// Per-day totals for records at or after `since_utc`, grouped by UTC date.
    async fn sum_intake_by_day(
        &self,
        user_id: UserId,
        since_utc: DateTime<Utc>,
    ) -> anyhow::Result<BTreeMap<NaiveDate, u32>>;

    async fn list_users_with_notifications_enabled(&self) -> anyhow::Result<Vec<UserProfile>>;
}
