use teloxide::prelude::*;

use chrono::Utc;

use crate::bot_state::BotState;
use crate::handlers::utils::{send_replies, sender_of, HandlerResult};
use crate::models::{ChatEvent, Coordinates};

pub async fn message_handler(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let replies = state
        .handle(msg.chat.id, &sender_of(&msg), event_of(&msg), Utc::now())
        .await;
    send_replies(&bot, msg.chat.id, &replies).await
}

/// Событие автомата для входящего сообщения.
pub fn event_of(msg: &Message) -> ChatEvent {
    if let Some(location) = msg.location() {
        ChatEvent::Location(Coordinates {
            latitude: location.latitude,
            longitude: location.longitude,
        })
    } else if let Some(text) = msg.text() {
        // неизвестные команды ведут в меню, как /start
        if text.starts_with('/') {
            ChatEvent::Start
        } else {
            ChatEvent::Text(text.to_string())
        }
    } else {
        ChatEvent::Start
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// Сообщение из личного чата 42 от пользователя 42 с дополнительными полями.
    pub(crate) fn private_message(extra: Value) -> Message {
        let mut value = json!({
            "message_id": 1,
            "date": 1740802530,
            "chat": { "id": 42, "type": "private", "first_name": "Ali" },
            "from": {
                "id": 42,
                "is_bot": false,
                "first_name": "Ali",
                "username": "ali_v"
            }
        });
        merge(&mut value, extra);
        serde_json::from_value(value).unwrap()
    }

    /// Пост канала: поля `from` нет.
    pub(crate) fn channel_post(extra: Value) -> Message {
        let mut value = json!({
            "message_id": 7,
            "date": 1740802530,
            "chat": { "id": -1001234567890i64, "type": "channel", "title": "Davomat" }
        });
        merge(&mut value, extra);
        serde_json::from_value(value).unwrap()
    }

    fn merge(value: &mut Value, extra: Value) {
        if let (Some(target), Value::Object(extra)) = (value.as_object_mut(), extra) {
            target.extend(extra);
        }
    }

    #[test]
    fn location_becomes_location_event() {
        let msg = private_message(json!({
            "location": { "latitude": 41.3, "longitude": 69.2 }
        }));
        assert_eq!(
            event_of(&msg),
            ChatEvent::Location(Coordinates { latitude: 41.3, longitude: 69.2 })
        );
    }

    #[test]
    fn keyword_text_is_passed_as_is() {
        let msg = private_message(json!({ "text": "Keldim" }));
        assert_eq!(event_of(&msg), ChatEvent::Text("Keldim".into()));

        let msg = private_message(json!({ "text": "keldim" }));
        assert_eq!(event_of(&msg), ChatEvent::Text("keldim".into()));
    }

    #[test]
    fn unknown_command_shows_menu() {
        let msg = private_message(json!({ "text": "/foo" }));
        assert_eq!(event_of(&msg), ChatEvent::Start);
    }

    #[test]
    fn sticker_shows_menu() {
        let msg = private_message(json!({
            "sticker": {
                "file_id": "CAACAgIAAxkBAAE",
                "file_unique_id": "AgADAQAD",
                "file_size": 1024,
                "width": 512,
                "height": 512,
                "is_animated": false,
                "is_video": false,
                "type": "regular",
                "emoji": "👍"
            }
        }));
        assert_eq!(event_of(&msg), ChatEvent::Start);
    }

    #[test]
    fn photo_shows_menu() {
        let msg = private_message(json!({
            "photo": [{
                "file_id": "AgACAgIAAxkBAAE",
                "file_unique_id": "AQADAgAD",
                "file_size": 2048,
                "width": 90,
                "height": 90
            }]
        }));
        assert_eq!(event_of(&msg), ChatEvent::Start);
    }

    #[test]
    fn channel_post_text_is_still_text() {
        let msg = channel_post(json!({ "text": "Ketdim" }));
        assert_eq!(event_of(&msg), ChatEvent::Text("Ketdim".into()));
    }
}
