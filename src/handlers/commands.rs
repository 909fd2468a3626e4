use teloxide::prelude::*;

use chrono::Utc;

use crate::bot_state::BotState;
use crate::handlers::utils::{send_replies, sender_of, HandlerResult, HELP_TEXT};
use crate::models::ChatEvent;

use crate::Command;

pub async fn command_handler(bot: Bot, msg: Message, cmd: Command, state: BotState) -> HandlerResult {
    if let Command::Help = cmd {
        bot.send_message(msg.chat.id, HELP_TEXT).await?;
    }

    let replies = state
        .handle(msg.chat.id, &sender_of(&msg), ChatEvent::Start, Utc::now())
        .await;
    send_replies(&bot, msg.chat.id, &replies).await
}
