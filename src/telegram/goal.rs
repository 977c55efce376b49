use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::storage::ProfileUpdate;
use crate::user::GOAL_OVERRIDE_RANGE_ML;

use super::{
    HandlerLocales, HandlerResult, HandlerStorage, client_lang_of_msg, message_user_id, user_lang,
};

#[derive(Debug, Clone, Copy)]
struct GoalAmount(u32);

fn parse_goal_amount(text: &str) -> Option<u32> {
    text.trim().strip_prefix("/goal")?.trim().parse().ok()
}

pub(super) async fn help(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;
    bot.send_message(msg.chat.id, locales.text("goal.help", &lang))
        .await?;
    Ok(())
}

async fn set_goal(
    bot: Bot,
    msg: Message,
    GoalAmount(goal_ml): GoalAmount,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    if !GOAL_OVERRIDE_RANGE_ML.contains(&goal_ml) {
        bot.send_message(msg.chat.id, locales.text("goal.invalid", &lang))
            .await?;
        return Ok(());
    }

    storage
        .apply_profile_update(
            user_id,
            ProfileUpdate {
                daily_goal_ml: Some(goal_ml),
                ..Default::default()
            },
        )
        .await?;

    bot.send_message(
        msg.chat.id,
        locales.text_with("goal.set", &lang, &[("goal", goal_ml.to_string())]),
    )
    .await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().and_then(parse_goal_amount).map(GoalAmount))
        .endpoint(set_goal)
}
