use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::delivery::{buttons_markup, drink_quick_buttons};
use crate::i18n::{Locales, SUPPORTED_LANGUAGES};

pub(super) fn gender_keyboard(locales: &Locales, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(locales.text("gender.male", lang), "male"),
        InlineKeyboardButton::callback(locales.text("gender.female", lang), "female"),
    ]])
}

pub(super) fn activity_keyboard(locales: &Locales, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            locales.text("activity.low", lang),
            "low",
        )],
        vec![InlineKeyboardButton::callback(
            locales.text("activity.medium", lang),
            "medium",
        )],
        vec![InlineKeyboardButton::callback(
            locales.text("activity.high", lang),
            "high",
        )],
    ])
}

pub(super) fn quick_drink_keyboard() -> InlineKeyboardMarkup {
    buttons_markup(&drink_quick_buttons())
}

pub(super) fn language_keyboard(current_lang: &str) -> InlineKeyboardMarkup {
    let rows = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| {
            let flag = match *code {
                "en" => "🇬🇧",
                "ru" => "🇷🇺",
                "de" => "🇩🇪",
                "zh" => "🇨🇳",
                "be" => "🇧🇾",
                _ => "🌐",
            };
            let mut label = format!("{flag} {name}");
            if *code == current_lang {
                label.push_str(" ✅");
            }
            vec![InlineKeyboardButton::callback(
                label,
                format!("set_lang_{code}"),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn reminder_toggle_keyboard(
    locales: &Locales,
    lang: &str,
    enabled: bool,
) -> InlineKeyboardMarkup {
    let key = if enabled {
        "reminders.turn_off"
    } else {
        "reminders.turn_on"
    };
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        locales.text(key, lang),
        "toggle_reminders",
    )]])
}
