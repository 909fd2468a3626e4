use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, ReplyMarkup};

use crate::bot_state::Reply;
use crate::models::{AttendanceStatus, Sender};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub const MENU_TEXT: &str = "Iltimos, tanlang:";
pub const LOCATION_BUTTON: &str = "📍 Joylashuvni yuborish";
pub const HELP_TEXT: &str = "ℹ️ Qanday ishlaydi:\n\
    1. 'Keldim' yoki 'Ketdim' ni tanlang.\n\
    2. Joylashuvingizni yuboring.\n\
    Vaqt va joylashuv jadvalga yoziladi.";

/// Главное меню: две кнопки статуса
pub fn main_menu_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(AttendanceStatus::ARRIVED_KEYWORD),
            KeyboardButton::new(AttendanceStatus::DEPARTED_KEYWORD),
        ]])
        .resize_keyboard(),
    )
}

/// Одна кнопка, запрашивающая геолокацию устройства
pub fn location_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(LOCATION_BUTTON).request(ButtonRequest::Location),
        ]])
        .resize_keyboard()
        .one_time_keyboard(),
    )
}

/// Текст и клавиатура для ответа.
pub fn render(reply: Reply) -> (&'static str, Option<ReplyMarkup>) {
    match reply {
        Reply::MainMenu => (MENU_TEXT, Some(main_menu_keyboard())),
        Reply::RequestLocation => (
            "📍 Iltimos, joylashuvingizni yuboring:",
            Some(location_keyboard()),
        ),
        Reply::KeywordsOnly => ("❗️Iltimos, faqat 'Keldim' yoki 'Ketdim' ni tanlang.", None),
        Reply::ChooseStatusFirst => ("❗️Avval 'Keldim' yoki 'Ketdim' ni tanlang.", None),
        Reply::Recorded => ("✅ Ma'lumotlar Google Sheets'ga yozildi.", None),
        Reply::WriteFailed => (
            "⚠️ Ma'lumotlarni yozib bo'lmadi. Iltimos, joylashuvni qayta yuboring.",
            None,
        ),
        Reply::StorageFailed => (
            "⚠️ Holatni saqlab bo'lmadi. Iltimos, qayta urinib ko'ring.",
            None,
        ),
    }
}

pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: &[Reply]) -> HandlerResult {
    for reply in replies {
        let (text, markup) = render(*reply);
        let request = bot.send_message(chat_id, text);
        match markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
    }
    Ok(())
}

/// Отправитель сообщения; без `from` идентификатором служит сам чат.
pub fn sender_of(msg: &Message) -> Sender {
    match msg.from.as_ref() {
        Some(user) => Sender {
            user_id: user.id.0 as i64,
            display_name: Some(user.first_name.clone()),
            username: user.username.clone(),
        },
        None => Sender {
            user_id: msg.chat.id.0,
            display_name: None,
            username: None,
        },
    }
}
