use std::str::FromStr;

use dptree::case;
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::goal::daily_goal_ml;
use crate::storage::ProfileUpdate;
use crate::user::{ActivityLevel, Gender, UserProfile, WEIGHT_RANGE_KG};

use super::{
    GlobalDialogue, GlobalState, HandlerLocales, HandlerResult, HandlerStorage, client_lang_of_msg,
    keyboards, message_user_id, query_user_id, user_lang,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ProfileSetupState {
    AwaitingGender,
    AwaitingWeight {
        gender: Gender,
    },
    AwaitingActivity {
        gender: Gender,
        weight_kg: u32,
    },
}

/// /start either greets a configured user or begins onboarding.
pub(super) async fn start(
    bot: Bot,
    dialogue: GlobalDialogue,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    let profile = storage.get_profile(user_id).await?;
    if profile.as_ref().is_some_and(UserProfile::is_configured) {
        bot.send_message(msg.chat.id, locales.text("start.welcome_back", &lang))
            .await?;
        dialogue.exit().await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, locales.text("start.greeting", &lang))
        .reply_markup(keyboards::gender_keyboard(&locales, &lang))
        .await?;
    dialogue
        .update(GlobalState::SettingUpProfile(ProfileSetupState::AwaitingGender))
        .await?;
    Ok(())
}

async fn receive_gender(
    bot: Bot,
    dialogue: GlobalDialogue,
    q: CallbackQuery,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = query_user_id(&q);
    let lang = user_lang(&*storage, user_id, q.from.language_code.as_deref()).await;

    let gender = q.data.as_deref().and_then(|data| Gender::from_str(data).ok());
    bot.answer_callback_query(q.id).await?;

    let Some(gender) = gender else {
        return Ok(());
    };

    bot.send_message(ChatId(user_id), locales.text("onboarding.ask_weight", &lang))
        .await?;
    dialogue
        .update(GlobalState::SettingUpProfile(
            ProfileSetupState::AwaitingWeight { gender },
        ))
        .await?;
    Ok(())
}

async fn receive_weight(
    bot: Bot,
    dialogue: GlobalDialogue,
    gender: Gender,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    let weight_kg = msg
        .text()
        .and_then(|text| text.trim().parse::<u32>().ok())
        .filter(|weight| WEIGHT_RANGE_KG.contains(weight));

    // Invalid input re-prompts without a state change.
    let Some(weight_kg) = weight_kg else {
        bot.send_message(msg.chat.id, locales.text("onboarding.invalid_weight", &lang))
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, locales.text("onboarding.ask_activity", &lang))
        .reply_markup(keyboards::activity_keyboard(&locales, &lang))
        .await?;
    dialogue
        .update(GlobalState::SettingUpProfile(
            ProfileSetupState::AwaitingActivity { gender, weight_kg },
        ))
        .await?;
    Ok(())
}

async fn receive_activity(
    bot: Bot,
    dialogue: GlobalDialogue,
    (gender, weight_kg): (Gender, u32),
    q: CallbackQuery,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = query_user_id(&q);
    let lang = user_lang(&*storage, user_id, q.from.language_code.as_deref()).await;

    let activity = q
        .data
        .as_deref()
        .and_then(|data| ActivityLevel::from_str(data).ok());
    bot.answer_callback_query(q.id).await?;

    let Some(activity_level) = activity else {
        return Ok(());
    };

    let goal = daily_goal_ml(gender, weight_kg, activity_level);
    storage
        .apply_profile_update(
            user_id,
            ProfileUpdate {
                gender: Some(gender),
                weight_kg: Some(weight_kg),
                activity_level: Some(activity_level),
                daily_goal_ml: Some(goal),
                ..Default::default()
            },
        )
        .await?;

    log::info!("User {user_id} finished onboarding with a daily goal of {goal} ml");

    bot.send_message(
        ChatId(user_id),
        locales.text_with("onboarding.done", &lang, &[("goal", goal.to_string())]),
    )
    .await?;
    dialogue.exit().await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message().branch(
        case![GlobalState::SettingUpProfile(state)]
            .branch(case![ProfileSetupState::AwaitingWeight { gender }].endpoint(receive_weight)),
    );

    let callback_handler = Update::filter_callback_query().branch(
        case![GlobalState::SettingUpProfile(state)]
            .branch(case![ProfileSetupState::AwaitingGender].endpoint(receive_gender))
            .branch(
                case![ProfileSetupState::AwaitingActivity { gender, weight_kg }]
                    .endpoint(receive_activity),
            ),
    );

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}
