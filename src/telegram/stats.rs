use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use teloxide::prelude::*;

use crate::i18n::Locales;

use super::{
    HandlerClock, HandlerLocales, HandlerResult, HandlerStorage, client_lang_of_msg, drink,
    message_user_id, user_lang,
};

const BAR_LENGTH: usize = 15;

pub(super) async fn report(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
    clock: HandlerClock,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    let goal = storage
        .get_profile(user_id)
        .await?
        .and_then(|p| p.daily_goal_ml);
    let Some(goal) = goal else {
        bot.send_message(msg.chat.id, locales.text("analyze.no_profile", &lang))
            .await?;
        return Ok(());
    };

    let now = clock.now_utc();
    let today_total = storage.sum_intake_today(user_id, now).await?;
    let percent = drink::progress_percent(today_total, goal);

    let weekly = storage
        .sum_intake_by_day(user_id, now - Duration::days(7))
        .await?;
    let week_summary = format_weekly(&weekly, goal, &lang, &locales, now.date_naive());

    let text = locales.text_with(
        "analyze.report",
        &lang,
        &[
            ("current", today_total.to_string()),
            ("goal", goal.to_string()),
            ("percent", percent.to_string()),
            ("bar", progress_bar(percent)),
            ("week_summary", week_summary),
        ],
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

fn progress_bar(percent: u32) -> String {
    let filled = BAR_LENGTH * percent as usize / 100;
    "█".repeat(filled) + &"░".repeat(BAR_LENGTH - filled)
}

/// One line per day over the trailing week, oldest first.
fn format_weekly(
    totals: &BTreeMap<NaiveDate, u32>,
    goal: u32,
    lang: &str,
    locales: &Locales,
    today: NaiveDate,
) -> String {
    let weekdays = locales.list("weekday", lang);
    let mut lines = Vec::with_capacity(7);

    for days_back in 0..7i64 {
        let day = today - Duration::days(days_back);
        let label = match days_back {
            0 => locales.text("analyze.today", lang),
            1 => locales.text("analyze.yesterday", lang),
            _ => weekdays
                .get(day.weekday().num_days_from_monday() as usize)
                .cloned()
                .unwrap_or_else(|| day.format("%d.%m").to_string()),
        };

        let amount = totals.get(&day).copied().unwrap_or(0);
        let line = if amount > 0 {
            let pct = drink::progress_percent(amount, goal);
            let emoji = if pct >= 100 { "✅" } else { "💧" };
            format!("{emoji} {label}: {amount} ml ({pct}%)")
        } else {
            format!("❌ {label}: 0 ml")
        };
        lines.push(line);
    }

    lines.reverse();
    lines.join("\n")
}
