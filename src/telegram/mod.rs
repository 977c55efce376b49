mod drink;
mod goal;
mod keyboards;
mod lang;
mod onboarding;
mod reminders;
mod stats;

use std::sync::Arc;
use std::time::Duration;

use dptree::case;
use teloxide::{
    dispatching::{UpdateHandler, dialogue, dialogue::InMemStorage},
    macros::BotCommands,
    prelude::*,
};

use crate::clock::Clock;
use crate::i18n::{Locales, resolve_language};
use crate::scheduling::ReminderScheduler;
use crate::storage::UserStorage;
use crate::user::UserId;

use onboarding::ProfileSetupState;

type GlobalDialogue = Dialogue<GlobalState, InMemStorage<GlobalState>>;
type HandlerResult = anyhow::Result<()>;
type HandlerStorage = Arc<dyn UserStorage>;
type HandlerLocales = Arc<Locales>;
type HandlerClock = Arc<dyn Clock>;

/// Delay between a recorded drink and the follow-up reminder.
#[derive(Debug, Clone, Copy)]
pub struct ReminderInterval(pub Duration);

#[derive(Default, Clone, Debug, PartialEq, Eq)]
enum GlobalState {
    #[default]
    Idle,
    SettingUpProfile(ProfileSetupState),
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "set up your profile and daily goal")]
    Start,
    #[command(description = "record a drink, e.g. /drink 250")]
    Drink,
    #[command(description = "today's and weekly statistics")]
    Stats,
    #[command(description = "override the daily goal, e.g. /goal 2500")]
    Goal,
    #[command(description = "choose the interface language")]
    Lang,
    #[command(description = "toggle reminders")]
    Reminder,
    #[command(description = "cancel the current operation")]
    Cancel,
}

pub struct TelegramInteractionInterface;

impl TelegramInteractionInterface {
    pub async fn start(
        bot: Bot,
        storage: HandlerStorage,
        scheduler: Arc<ReminderScheduler>,
        locales: HandlerLocales,
        clock: HandlerClock,
        reminder_interval: ReminderInterval,
    ) {
        log::info!("Starting Telegram interaction interface");

        Dispatcher::builder(bot, schema())
            .dependencies(dptree::deps![
                InMemStorage::<GlobalState>::new(),
                storage,
                scheduler,
                locales,
                clock,
                reminder_interval
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

fn schema() -> UpdateHandler<anyhow::Error> {
    // /cancel must win over dialogue-state handlers, which otherwise
    // swallow any message while onboarding waits for a weight.
    let cancel_handler = Update::filter_message().branch(
        teloxide::filter_command::<Command, _>().branch(case![Command::Cancel].endpoint(cancel)),
    );

    let command_handler = Update::filter_message().branch(
        teloxide::filter_command::<Command, _>()
            .branch(case![Command::Start].endpoint(onboarding::start))
            .branch(case![Command::Drink].endpoint(drink::help))
            .branch(case![Command::Stats].endpoint(stats::report))
            .branch(case![Command::Goal].endpoint(goal::help))
            .branch(case![Command::Lang].endpoint(lang::menu))
            .branch(case![Command::Reminder].endpoint(reminders::status)),
    );

    let invalid_state_handler = Update::filter_message().branch(dptree::endpoint(invalid_state));
    let invalid_callback_handler =
        Update::filter_callback_query().branch(dptree::endpoint(invalid_query));

    dialogue::enter::<Update, InMemStorage<GlobalState>, GlobalState, _>()
        .branch(cancel_handler)
        .branch(onboarding::schema())
        .branch(goal::schema())
        .branch(drink::schema())
        .branch(command_handler)
        .branch(lang::schema())
        .branch(reminders::schema())
        .branch(invalid_state_handler)
        .branch(invalid_callback_handler)
}

fn message_user_id(msg: &Message) -> UserId {
    // Private chats only: the chat id equals the Telegram user id.
    msg.chat.id.0
}

fn query_user_id(q: &CallbackQuery) -> UserId {
    q.from.id.0 as UserId
}

fn client_lang_of_msg(msg: &Message) -> Option<&str> {
    msg.from.as_ref()?.language_code.as_deref()
}

/// Stored preference first, then the Telegram client locale, then default.
async fn user_lang(storage: &dyn UserStorage, user_id: UserId, client: Option<&str>) -> String {
    let stored = match storage.get_profile(user_id).await {
        Ok(profile) => profile.and_then(|p| p.language),
        Err(e) => {
            log::warn!("Failed to load profile of user {user_id} for language lookup: {e:#}");
            None
        }
    };
    resolve_language(stored.as_deref(), client)
}

async fn cancel(
    bot: Bot,
    dialogue: GlobalDialogue,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;
    bot.send_message(msg.chat.id, locales.text("cancel.done", &lang))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn invalid_state(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;
    bot.send_message(msg.chat.id, locales.text("fallback.unhandled", &lang))
        .await?;
    Ok(())
}

async fn invalid_query(bot: Bot, query: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(query.id).await?;
    Ok(())
}
