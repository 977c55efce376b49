use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::{
    sync::{RwLock, watch},
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::clock::{self, Clock};
use crate::delivery::{DeliveryChannel, drink_quick_buttons};
use crate::i18n::{Locales, resolve_language};
use crate::storage::UserStorage;
use crate::user::UserId;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    fn cancel(&self) {
        self.cancellation_token.cancel();
    }
}

type ReminderTaskTable = RwLock<HashMap<UserId, ScheduledTask>>;

struct CleanupTask(watch::Sender<()>);

enum FireOutcome {
    Sent,
    Skipped,
    Deferred,
}

/// Per-user reminder timers. At most one pending task per user: a newer
/// `schedule_next` call supersedes and cancels the previous one, so a user
/// who drinks repeatedly never receives overlapping reminders.
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
    cleanup_task: CleanupTask,
}

struct SchedulerInner {
    tasks: Arc<ReminderTaskTable>,
    storage: Arc<dyn UserStorage>,
    delivery_channel: Arc<dyn DeliveryChannel>,
    locales: Arc<Locales>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(
        storage: Arc<dyn UserStorage>,
        delivery_channel: Arc<dyn DeliveryChannel>,
        locales: Arc<Locales>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tasks = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&tasks));

        Self {
            inner: Arc::new(SchedulerInner {
                tasks,
                storage,
                delivery_channel,
                locales,
                clock,
            }),
            cleanup_task,
        }
    }

    /// Arms (or re-arms) the reminder timer for `user_id`. Any pending task
    /// for the same user is cancelled first. Returns once the task is
    /// registered, never waits out the delay itself.
    pub async fn schedule_next(&self, user_id: UserId, delay: Duration) {
        Arc::clone(&self.inner).schedule_next(user_id, delay).await;
    }

    /// Cancels the pending task for `user_id`, if any. Idempotent.
    pub async fn cancel(&self, user_id: UserId) {
        if let Some(task) = self.inner.tasks.write().await.remove(&user_id) {
            task.cancel();
            log::debug!("Cancelled pending reminder for user {user_id}");
        }
    }

    /// Number of live timer entries. Intended for introspection and tests.
    pub async fn pending_tasks(&self) -> usize {
        self.inner.tasks.read().await.len()
    }

    fn spawn_cleanup_task(tasks: Arc<ReminderTaskTable>) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&tasks).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Reminder cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_tasks(tasks: &ReminderTaskTable) {
        let mut tasks = tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| !task.task_handle.is_finished());
        let after = tasks.len();

        if before != after {
            log::info!("Cleaned up {} finished reminder tasks", before - after);
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        let _ = self.cleanup_task.0.send(());
    }
}

impl SchedulerInner {
    // Boxed return type breaks the `Send` auto-trait cycle created by the
    // recursion schedule_next -> spawn -> fire -> run_fire -> schedule_next.
    fn schedule_next(
        self: Arc<Self>,
        user_id: UserId,
        delay: Duration,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();

        let inner = Arc::clone(&self);
        let task_handle = task::spawn(async move {
            let fire_token = task_token.clone();
            tokio::select! {
                _ = task_token.cancelled() => {
                    log::debug!("Reminder task for user {user_id} was superseded or cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    inner.fire(user_id, fire_token).await;
                }
            }
        });

        // Cancel-old then register-new with no await point in between, so
        // the most recent schedule_next always wins for a given user.
        let mut tasks = self.tasks.write().await;
        if let Some(old) = tasks.remove(&user_id) {
            old.cancel();
        }
        tasks.insert(
            user_id,
            ScheduledTask {
                task_handle,
                cancellation_token,
            },
        );
        })
    }

    /// Failure boundary: nothing below this may escape and kill the timer
    /// task, and the user's table entry never dangles.
    async fn fire(self: Arc<Self>, user_id: UserId, token: CancellationToken) {
        match Arc::clone(&self).run_fire(user_id).await {
            // schedule_next has already replaced our table entry.
            Ok(FireOutcome::Deferred) => return,
            Ok(FireOutcome::Sent) => log::info!("Sent reminder to user {user_id}"),
            Ok(FireOutcome::Skipped) => {}
            Err(e) => log::error!("Failed to deliver reminder to user {user_id}: {e:#}"),
        }

        // The token check guards against removing a task that superseded us
        // while we were executing the fire body.
        let mut tasks = self.tasks.write().await;
        if !token.is_cancelled() {
            tasks.remove(&user_id);
        }
    }

    async fn run_fire(self: Arc<Self>, user_id: UserId) -> anyhow::Result<FireOutcome> {
        let Some(profile) = self.storage.get_profile(user_id).await? else {
            log::debug!("Reminder fired for unknown user {user_id}, dropping");
            return Ok(FireOutcome::Skipped);
        };
        if !profile.notifications_enabled {
            return Ok(FireOutcome::Skipped);
        }

        let now = self.clock.now_utc();
        let local = clock::local_time_of_day(now, profile.timezone_offset_minutes);

        if !clock::allowed_window_contains(local) {
            let delay =
                clock::delay_to_next_morning(now, profile.timezone_offset_minutes, clock::MORNING_HOUR);
            log::info!(
                "User {user_id} is outside the allowed window (local time {local}), deferring reminder for {delay:?}"
            );
            self.schedule_next(user_id, delay).await;
            return Ok(FireOutcome::Deferred);
        }

        let lang = resolve_language(profile.language.as_deref(), None);
        let text = self.locales.text("reminders.notification", &lang);
        self.delivery_channel
            .send_message(user_id, &text, &drink_quick_buttons())
            .await?;

        Ok(FireOutcome::Sent)
    }
}
