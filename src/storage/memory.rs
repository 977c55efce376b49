use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use super::{ProfileUpdate, UserStorage};
use crate::user::{IntakeRecord, UserId, UserProfile};

#[derive(Default)]
struct Store {
    profiles: HashMap<UserId, UserProfile>,
    intakes: Vec<IntakeRecord>,
}

pub struct InMemoryUserStorage {
    store: RwLock<Store>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }
}

impl Default for InMemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn get_profile(&self, user_id: UserId) -> anyhow::Result<Option<UserProfile>> {
        let store = self.store.read().await;
        Ok(store.profiles.get(&user_id).cloned())
    }

    async fn apply_profile_update(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> anyhow::Result<UserProfile> {
        let mut store = self.store.write().await;
        let profile = store
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id));

        if let Some(gender) = update.gender {
            profile.gender = gender;
        }
        if let Some(weight_kg) = update.weight_kg {
            profile.weight_kg = Some(weight_kg);
        }
        if let Some(activity_level) = update.activity_level {
            profile.activity_level = Some(activity_level);
        }
        if let Some(daily_goal_ml) = update.daily_goal_ml {
            profile.daily_goal_ml = Some(daily_goal_ml);
        }
        if let Some(offset) = update.timezone_offset_minutes {
            profile.timezone_offset_minutes = offset;
        }
        if let Some(language) = update.language {
            profile.language = Some(language);
        }
        if let Some(enabled) = update.notifications_enabled {
            profile.notifications_enabled = enabled;
        }

        Ok(profile.clone())
    }

    async fn append_intake(
        &self,
        user_id: UserId,
        amount_ml: u32,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        store.intakes.push(IntakeRecord {
            user_id,
            amount_ml,
            timestamp,
        });
        Ok(())
    }

    async fn sum_intake_today(
        &self,
        user_id: UserId,
        now_utc: DateTime<Utc>,
    ) -> anyhow::Result<u32> {
        let today = now_utc.date_naive();
        let store = self.store.read().await;
        Ok(store
            .intakes
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp.date_naive() == today)
            .map(|r| r.amount_ml)
            .sum())
    }

    async fn sum_intake_by_day(
        &self,
        user_id: UserId,
        since_utc: DateTime<Utc>,
    ) -> anyhow::Result<BTreeMap<NaiveDate, u32>> {
        let store = self.store.read().await;
        let mut totals = BTreeMap::new();
        for record in store
            .intakes
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp >= since_utc)
        {
            *totals.entry(record.timestamp.date_naive()).or_insert(0) += record.amount_ml;
        }
        Ok(totals)
    }

    async fn list_users_with_notifications_enabled(&self) -> anyhow::Result<Vec<UserProfile>> {
        let store = self.store.read().await;
        Ok(store
            .profiles
            .values()
            .filter(|p| p.notifications_enabled)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime, NaiveTime};

    fn utc(y: i32, m: u32, d: u32, hh: u32) -> DateTime<Utc> {
        let naive = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(hh, 0, 0).unwrap(),
        );
        DateTime::from_naive_utc_and_offset(naive, Utc)
    }

    #[tokio::test]
    async fn update_creates_stub_profile() {
        let storage = InMemoryUserStorage::new();
        let profile = storage
            .apply_profile_update(
                7,
                ProfileUpdate {
                    language: Some("ru".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.language.as_deref(), Some("ru"));
        assert!(!profile.is_configured());
        assert!(profile.notifications_enabled);
    }

    #[tokio::test]
    async fn update_keeps_unset_fields() {
        let storage = InMemoryUserStorage::new();
        storage
            .apply_profile_update(
                7,
                ProfileUpdate {
                    daily_goal_ml: Some(2100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let profile = storage
            .apply_profile_update(
                7,
                ProfileUpdate {
                    notifications_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.daily_goal_ml, Some(2100));
        assert!(!profile.notifications_enabled);
    }

    #[tokio::test]
    async fn today_sum_ignores_other_days_and_users() {
        let storage = InMemoryUserStorage::new();
        let now = utc(2025, 5, 31, 12);

        storage.append_intake(1, 200, now).await.unwrap();
        storage.append_intake(1, 300, utc(2025, 5, 31, 0)).await.unwrap();
        storage.append_intake(1, 500, utc(2025, 5, 30, 23)).await.unwrap();
        storage.append_intake(2, 999, now).await.unwrap();

        assert_eq!(storage.sum_intake_today(1, now).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn weekly_totals_group_by_day() {
        let storage = InMemoryUserStorage::new();
        let now = utc(2025, 5, 31, 12);

        storage.append_intake(1, 200, now).await.unwrap();
        storage.append_intake(1, 300, now - Duration::days(1)).await.unwrap();
        storage.append_intake(1, 100, now - Duration::days(1)).await.unwrap();
        storage.append_intake(1, 400, now - Duration::days(8)).await.unwrap();

        let totals = storage
            .sum_intake_by_day(1, now - Duration::days(7))
            .await
            .unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()], 200);
        assert_eq!(totals[&NaiveDate::from_ymd_opt(2025, 5, 30).unwrap()], 400);
    }

    #[tokio::test]
    async fn lists_only_opted_in_users() {
        let storage = InMemoryUserStorage::new();
        storage
            .apply_profile_update(1, ProfileUpdate::default())
            .await
            .unwrap();
        storage
            .apply_profile_update(
                2,
                ProfileUpdate {
                    notifications_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let users = storage.list_users_with_notifications_enabled().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, 1);
    }
}
