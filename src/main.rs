mod appsettings;
mod clock;
mod delivery;
mod goal;
mod i18n;
mod scheduling;
mod storage;
mod telegram;
mod user;

use std::sync::Arc;
use std::time::Duration;

use teloxide::Bot;

use crate::clock::{Clock, SystemClock};
use crate::delivery::{DeliveryChannel, TelegramDeliveryChannel};
use crate::i18n::Locales;
use crate::scheduling::{IntervalBroadcaster, ReminderScheduler};
use crate::storage::{InMemoryUserStorage, UserStorage};
use crate::telegram::{ReminderInterval, TelegramInteractionInterface};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::get();
    let locales = Arc::new(Locales::load_from_dir(&settings.localization.locales_dir));
    let storage: Arc<dyn UserStorage> = Arc::new(InMemoryUserStorage::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let bot = Bot::new(settings.telegram.token.clone());
    let delivery_channel: Arc<dyn DeliveryChannel> =
        Arc::new(TelegramDeliveryChannel::new(bot.clone()));

    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::clone(&storage),
        Arc::clone(&delivery_channel),
        Arc::clone(&locales),
        Arc::clone(&clock),
    ));

    let _broadcaster = settings.reminders.broadcast_enabled.then(|| {
        log::info!(
            "Interval broadcaster enabled, every {} minutes",
            settings.reminders.broadcast_interval_minutes
        );
        IntervalBroadcaster::spawn(
            Arc::clone(&storage),
            Arc::clone(&delivery_channel),
            Arc::clone(&locales),
            Arc::clone(&clock),
            Duration::from_secs(settings.reminders.broadcast_interval_minutes * 60),
        )
    });

    TelegramInteractionInterface::start(
        bot,
        storage,
        scheduler,
        locales,
        clock,
        ReminderInterval(Duration::from_secs(settings.reminders.interval_minutes * 60)),
    )
    .await;
}
