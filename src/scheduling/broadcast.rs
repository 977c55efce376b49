use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task};

use crate::clock::{self, Clock};
use crate::delivery::{DeliveryChannel, drink_quick_buttons};
use crate::i18n::{Locales, resolve_language};
use crate::storage::UserStorage;

/// Stateless periodic broadcaster: every interval, messages all users with
/// notifications enabled whose local time is inside the allowed window.
///
/// This is the simpler alternative to the per-user [`ReminderScheduler`]
/// and is disabled by default; see `reminders.broadcast_enabled`.
///
/// [`ReminderScheduler`]: super::ReminderScheduler
pub struct IntervalBroadcaster {
    shutdown: watch::Sender<()>,
}

impl IntervalBroadcaster {
    pub fn spawn(
        storage: Arc<dyn UserStorage>,
        delivery_channel: Arc<dyn DeliveryChannel>,
        locales: Arc<Locales>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so the first
            // broadcast happens one full interval after startup.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::broadcast_round(&*storage, &*delivery_channel, &locales, &*clock).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Broadcast loop shutting down");
                        break;
                    }
                };
            }
        });

        Self {
            shutdown: shutdown_tx,
        }
    }

    async fn broadcast_round(
        storage: &dyn UserStorage,
        delivery_channel: &dyn DeliveryChannel,
        locales: &Locales,
        clock: &dyn Clock,
    ) {
        let users = match storage.list_users_with_notifications_enabled().await {
            Ok(users) => users,
            Err(e) => {
                log::error!("Failed to list users for broadcast: {e:#}");
                return;
            }
        };

        let now = clock.now_utc();
        for profile in users {
            let local = clock::local_time_of_day(now, profile.timezone_offset_minutes);
            if !clock::allowed_window_contains(local) {
                continue;
            }

            let lang = resolve_language(profile.language.as_deref(), None);
            let text = locales.text("reminders.notification", &lang);
            if let Err(e) = delivery_channel
                .send_message(profile.user_id, &text, &drink_quick_buttons())
                .await
            {
                log::warn!("Failed to broadcast reminder to user {}: {e:#}", profile.user_id);
            }
        }
    }
}

impl Drop for IntervalBroadcaster {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::delivery::QuickButton;
    use crate::storage::{InMemoryUserStorage, ProfileUpdate};
    use crate::user::UserId;

    struct RecordingChannel {
        sent: Mutex<Vec<UserId>>,
    }

    #[async_trait]
    impl DeliveryChannel for RecordingChannel {
        async fn send_message(
            &self,
            user_id: UserId,
            _text: &str,
            _buttons: &[QuickButton],
        ) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(user_id);
            Ok(())
        }
    }

    fn midday() -> DateTime<Utc> {
        let naive = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        );
        DateTime::from_naive_utc_and_offset(naive, Utc)
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasts_only_inside_each_users_window() {
        let storage = Arc::new(InMemoryUserStorage::new());
        // User 1: zero offset, local midday. User 2: UTC+11, local 23:00.
        // User 3: opted out.
        storage.apply_profile_update(1, ProfileUpdate::default()).await.unwrap();
        storage
            .apply_profile_update(
                2,
                ProfileUpdate {
                    timezone_offset_minutes: Some(660),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        storage
            .apply_profile_update(
                3,
                ProfileUpdate {
                    notifications_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
        });

        let _broadcaster = IntervalBroadcaster::spawn(
            storage,
            channel.clone(),
            Arc::new(Locales::empty()),
            Arc::new(ManualClock::at(midday())),
            Duration::from_secs(600),
        );

        tokio::time::sleep(Duration::from_secs(610)).await;

        assert_eq!(*channel.sent.lock().unwrap(), vec![1]);
    }
}
