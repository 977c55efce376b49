use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::scheduling::ReminderScheduler;
use crate::storage::ProfileUpdate;

use super::{
    HandlerLocales, HandlerResult, HandlerStorage, client_lang_of_msg, keyboards, message_user_id,
    query_user_id, user_lang,
};

pub(super) async fn status(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    let Some(profile) = storage.get_profile(user_id).await? else {
        bot.send_message(msg.chat.id, locales.text("reminders.no_profile", &lang))
            .await?;
        return Ok(());
    };

    let enabled = profile.notifications_enabled;
    bot.send_message(msg.chat.id, status_text(&locales, &lang, enabled))
        .reply_markup(keyboards::reminder_toggle_keyboard(&locales, &lang, enabled))
        .await?;
    Ok(())
}

async fn toggle(
    bot: Bot,
    q: CallbackQuery,
    storage: HandlerStorage,
    scheduler: Arc<ReminderScheduler>,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = query_user_id(&q);
    let lang = user_lang(&*storage, user_id, q.from.language_code.as_deref()).await;

    let Some(profile) = storage.get_profile(user_id).await? else {
        bot.answer_callback_query(q.id)
            .text(locales.text("reminders.no_profile", &lang))
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let enabled = !profile.notifications_enabled;
    storage
        .apply_profile_update(
            user_id,
            ProfileUpdate {
                notifications_enabled: Some(enabled),
                ..Default::default()
            },
        )
        .await?;

    // Opting out also drops any armed timer.
    if !enabled {
        scheduler.cancel(user_id).await;
    }

    bot.answer_callback_query(q.id).await?;
    bot.send_message(ChatId(user_id), status_text(&locales, &lang, enabled))
        .reply_markup(keyboards::reminder_toggle_keyboard(&locales, &lang, enabled))
        .await?;
    Ok(())
}

fn status_text(locales: &HandlerLocales, lang: &str, enabled: bool) -> String {
    let state_key = if enabled {
        "reminders.enabled"
    } else {
        "reminders.disabled"
    };
    locales.text_with(
        "reminders.status",
        lang,
        &[("status", locales.text(state_key, lang))],
    )
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query()
        .filter(|q: CallbackQuery| q.data.as_deref() == Some("toggle_reminders"))
        .endpoint(toggle)
}
