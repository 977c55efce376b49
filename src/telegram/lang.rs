use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::i18n::is_supported;
use crate::storage::ProfileUpdate;

use super::{
    HandlerLocales, HandlerResult, HandlerStorage, client_lang_of_msg, keyboards, message_user_id,
    query_user_id, user_lang,
};

#[derive(Debug, Clone)]
struct LanguageChoice(String);

pub(super) async fn menu(
    bot: Bot,
    msg: Message,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = message_user_id(&msg);
    let lang = user_lang(&*storage, user_id, client_lang_of_msg(&msg)).await;

    bot.send_message(msg.chat.id, locales.text("lang.choose", &lang))
        .reply_markup(keyboards::language_keyboard(&lang))
        .await?;
    Ok(())
}

async fn set_language(
    bot: Bot,
    q: CallbackQuery,
    LanguageChoice(code): LanguageChoice,
    storage: HandlerStorage,
    locales: HandlerLocales,
) -> HandlerResult {
    let user_id = query_user_id(&q);

    if !is_supported(&code) {
        bot.answer_callback_query(q.id)
            .text("Unsupported language.")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    storage
        .apply_profile_update(
            user_id,
            ProfileUpdate {
                language: Some(code.clone()),
                ..Default::default()
            },
        )
        .await?;
    bot.answer_callback_query(q.id).await?;

    // Confirm in the freshly chosen language.
    bot.send_message(ChatId(user_id), locales.text("lang.changed", &code))
        .await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| {
            q.data
                .as_deref()
                .and_then(|data| data.strip_prefix("set_lang_"))
                .map(|code| LanguageChoice(code.to_owned()))
        })
        .endpoint(set_language)
}
