//! Delivery of wizard replies and the category quick-reply keyboard.

use taskbridge_core::{Delivery, Markup, Reply};
use taskbridge_models::TaskCategory;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

/// Prefix of callback data sent by the category keyboard.
const CATEGORY_CALLBACK_PREFIX: &str = "type_";

/// Callback data for a category button, e.g. `type_deep`.
pub fn category_callback_data(category: TaskCategory) -> String {
    format!("{}{}", CATEGORY_CALLBACK_PREFIX, category.as_str())
}

/// Category picked by a keyboard button, if the data came from one.
pub fn parse_category_callback(data: &str) -> Option<TaskCategory> {
    let name = data.strip_prefix(CATEGORY_CALLBACK_PREFIX)?;
    TaskCategory::ALL.into_iter().find(|c| c.as_str() == name)
}

/// Deep/Light buttons, one per row.
pub fn category_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🔴 Deep Work",
            category_callback_data(TaskCategory::Deep),
        )],
        vec![InlineKeyboardButton::callback(
            "🟢 Light Work",
            category_callback_data(TaskCategory::Light),
        )],
    ])
}

fn keyboard_for(markup: Markup) -> Option<InlineKeyboardMarkup> {
    match markup {
        Markup::None => None,
        Markup::CategoryChoice => Some(category_keyboard()),
    }
}

/// Send a wizard reply to a chat.
///
/// Edits `previous` in place when the reply asks for it and a message is
/// known; otherwise sends a new message.
pub async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: Reply,
    previous: Option<MessageId>,
) -> ResponseResult<()> {
    let keyboard = keyboard_for(reply.markup);

    if let (Delivery::EditPrevious, Some(message_id)) = (reply.delivery, previous) {
        let mut req = bot
            .edit_message_text(chat_id, message_id, reply.text)
            .parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard {
            req = req.reply_markup(kb);
        }
        req.await?;
        return Ok(());
    }

    let mut req = bot
        .send_message(chat_id, reply.text)
        .parse_mode(ParseMode::Html);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    req.await?;
    Ok(())
}

/// Send an HTML message.
pub async fn send_html(bot: &Bot, chat_id: ChatId, text: impl Into<String>) -> ResponseResult<()> {
    bot.send_message(chat_id, text.into())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
