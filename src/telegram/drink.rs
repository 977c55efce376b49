use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::scheduling::ReminderScheduler;
use crate::user::{INTAKE_RANGE_ML, UserId};

use super::{
    HandlerClock, HandlerLocales, HandlerResult, HandlerStorage, ReminderInterval,
    client_lang_of_msg, keyboards, message_user_id, query_user_id, user_lang,
};

#[derive(Debug, Clone, Copy)]
struct IntakeAmount(u32);

/// Accepts a bare number ("300") or a "/drink 250" message.
fn parse_message_amount(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let rest = trimmed
        .strip_prefix("/drink")
        .map(str::trim)
        .unwrap_or(trimmed);
    if rest.is_empty() {
        return None;
    }
    rest.parse().ok()
}

fn parse_callback_amount(data: &str) -> Option<u32> {
    data.strip_prefix("drink_")?.parse().ok()
}

pub(super) async fn help(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;
    bot.send_message(msg.chat.id, locales.text("drink.help", &lang))
        .reply_markup(keyboards::quick_drink_keyboard())
        .await?;
    Ok(())
}

async fn record_from_message(
    bot: Bot,
    msg: Message,
    IntakeAmount(amount): IntakeAmount,
    storage: HandlerStorage,
    scheduler: Arc<ReminderScheduler>,
    locales: HandlerLocales,
    clock: HandlerClock,
    interval: ReminderInterval,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;
    let reply = record_intake(
        user_id, amount, &lang, &storage, &scheduler, &locales, &clock, interval,
    )
    .await?;

    bot.send_message(msg.chat.id, reply)
        .reply_markup(keyboards::quick_drink_keyboard())
        .await?;
    Ok(())
}

async fn record_from_callback(
    bot: Bot,
    q: CallbackQuery,
    IntakeAmount(amount): IntakeAmount,
    storage: HandlerStorage,
    scheduler: Arc<ReminderScheduler>,
    locales: HandlerLocales,
    clock: HandlerClock,
    interval: ReminderInterval,
) -> HandlerResult {
    let user_id = query_user_id(&q);
    let lang = user_lang(&*storage, user_id, q.from.language_code.as_deref()).await;
    bot.answer_callback_query(q.id).await?;

    let reply = record_intake(
        user_id, amount, &lang, &storage, &scheduler, &locales, &clock, interval,
    )
    .await?;

    bot.send_message(ChatId(user_id), reply)
        .reply_markup(keyboards::quick_drink_keyboard())
        .await?;
    Ok(())
}

/// Stores the intake, re-arms the personal reminder and renders the reply.
#[allow(clippy::too_many_arguments)]
async fn record_intake(
    user_id: UserId,
    amount: u32,
    lang: &str,
    storage: &HandlerStorage,
    scheduler: &ReminderScheduler,
    locales: &HandlerLocales,
    clock: &HandlerClock,
    interval: ReminderInterval,
) -> anyhow::Result<String> {
    if !INTAKE_RANGE_ML.contains(&amount) {
        return Ok(locales.text("drink.invalid_amount", lang));
    }

    let now = clock.now_utc();
    storage.append_intake(user_id, amount, now).await?;

    let profile = storage.get_profile(user_id).await?;
    if profile.as_ref().is_some_and(|p| p.notifications_enabled) {
        scheduler.schedule_next(user_id, interval.0).await;
    }

    let Some(goal) = profile.and_then(|p| p.daily_goal_ml) else {
        return Ok(locales.text_with("drink.added", lang, &[("amount", amount.to_string())]));
    };

    let today_total = storage.sum_intake_today(user_id, now).await?;
    let percent = progress_percent(today_total, goal);
    Ok(locales.text_with(
        "drink.added_with_progress",
        lang,
        &[
            ("amount", amount.to_string()),
            ("current", today_total.to_string()),
            ("goal", goal.to_string()),
            ("percent", percent.to_string()),
        ],
    ))
}

pub(super) fn progress_percent(current: u32, goal: u32) -> u32 {
    if goal == 0 {
        return 0;
    }
    ((f64::from(current) / f64::from(goal) * 100.0).round() as u32).min(100)
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message()
        .filter_map(|msg: Message| msg.text().and_then(parse_message_amount).map(IntakeAmount))
        .endpoint(record_from_message);

    let callback_handler = Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| {
            q.data
                .as_deref()
                .and_then(parse_callback_amount)
                .map(IntakeAmount)
        })
        .endpoint(record_from_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_numbers_and_drink_commands() {
        assert_eq!(parse_message_amount("300"), Some(300));
        assert_eq!(parse_message_amount("  250 "), Some(250));
        assert_eq!(parse_message_amount("/drink 250"), Some(250));
        assert_eq!(parse_message_amount("/drink"), None);
        assert_eq!(parse_message_amount("some water"), None);
        assert_eq!(parse_message_amount("/start"), None);
    }

    #[test]
    fn parses_quick_button_callbacks() {
        assert_eq!(parse_callback_amount("drink_200"), Some(200));
        assert_eq!(parse_callback_amount("drink_"), None);
        assert_eq!(parse_callback_amount("toggle_reminders"), None);
    }

    #[test]
    fn percent_is_capped_and_rounded() {
        assert_eq!(progress_percent(500, 2000), 25);
        assert_eq!(progress_percent(1, 3000), 0);
        assert_eq!(progress_percent(2500, 2000), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }
}
