use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::user::UserId;

/// An inline button attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickButton {
    pub label: String,
    pub data: String,
}

/// Quick-add buttons offered with drink prompts and reminders.
pub fn drink_quick_buttons() -> Vec<QuickButton> {
    [100u32, 200, 300, 500]
        .into_iter()
        .map(|amount| QuickButton {
            label: format!("+{amount} ml"),
            data: format!("drink_{amount}"),
        })
        .collect()
}

/// Outward message channel. Delivery may fail; callers decide whether the
/// failure is logged and swallowed or surfaced.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
        buttons: &[QuickButton],
    ) -> anyhow::Result<()>;
}

pub struct TelegramDeliveryChannel {
    bot: Bot,
}

impl TelegramDeliveryChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub fn buttons_markup(buttons: &[QuickButton]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl DeliveryChannel for TelegramDeliveryChannel {
    async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
        buttons: &[QuickButton],
    ) -> anyhow::Result<()> {
        let request = self.bot.send_message(ChatId(user_id), text.to_owned());
        if buttons.is_empty() {
            request.await?;
        } else {
            request.reply_markup(buttons_markup(buttons)).await?;
        }
        Ok(())
    }
}
