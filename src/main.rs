use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

mod bot_state;
mod config;
mod handlers;
mod health;
mod models;
mod sheets;
mod storage;
mod writer;

use crate::bot_state::BotState;
use crate::config::Config;
use crate::handlers::{command_handler, message_handler};
use crate::sheets::GoogleSheet;
use crate::storage::JsonFileStatusStore;
use crate::writer::RecordWriter;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Mavjud buyruqlar:")]
enum Command {
    #[command(description = "menyuni ko'rsatish")]
    Start,
    #[command(description = "yordam")]
    Help,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting attendance bot...");

    let config = Config::from_env()?;

    // Health поднимаем первым: хостинг ждёт открытый порт
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            log::error!("❌ Health probe failed: {:#}", e);
        }
    });

    let store = JsonFileStatusStore::load(&config.status_file).await;
    let status_path = store.path().display().to_string();

    let sheet = GoogleSheet::connect(
        config.google_credentials.clone(),
        &config.spreadsheet_name,
        config.sheets_timeout,
    )
    .await?;
    let writer = RecordWriter::new(Arc::new(sheet), config.sheets_timeout);

    let state = BotState::new(Arc::new(store), writer);
    log::info!(
        "✅ Loaded {} pending statuses from {}",
        state.pending_count().await,
        status_path
    );

    let bot = Bot::new(config.bot_token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
