use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, RwLock};

use crate::models::{decide, AttendanceRecord, ChatEvent, ChatState, Decision, Sender};
use crate::storage::StatusStore;
use crate::writer::RecordWriter;

type ChatLocks = Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>;

/// Что показать пользователю, по порядку.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    MainMenu,
    RequestLocation,
    KeywordsOnly,
    ChooseStatusFirst,
    Recorded,
    WriteFailed,
    StorageFailed,
}

/// Общее состояние обработчиков: хранилище статусов и запись в таблицу.
#[derive(Clone)]
pub struct BotState {
    store: Arc<dyn StatusStore>,
    writer: Arc<RecordWriter>,
    chat_locks: ChatLocks,
}

impl BotState {
    pub fn new(store: Arc<dyn StatusStore>, writer: RecordWriter) -> Self {
        Self {
            store,
            writer: Arc::new(writer),
            chat_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.store.len().await
    }

    /// Обрабатывает одно событие чата целиком.
    ///
    /// Чтение статуса, запись в таблицу и очистка статуса идут под
    /// замком этого чата, чтобы два location подряд не дали две строки.
    pub async fn handle(
        &self,
        chat_id: ChatId,
        sender: &Sender,
        event: ChatEvent,
        at: DateTime<Utc>,
    ) -> Vec<Reply> {
        let key = chat_id.to_string();
        let lock = self.chat_lock(&key).await;
        let replies = {
            let _guard = lock.lock().await;
            self.handle_locked(&key, sender, event, at).await
        };
        self.release_chat_lock(&key, lock).await;
        replies
    }

    async fn handle_locked(
        &self,
        key: &str,
        sender: &Sender,
        event: ChatEvent,
        at: DateTime<Utc>,
    ) -> Vec<Reply> {
        let state = ChatState::from(self.store.get(key).await);
        let decision = decide(state, &event);
        log::debug!("Chat {}: {:?} + {:?} -> {:?}", key, state, event, decision);

        match decision {
            Decision::ShowMenu => vec![Reply::MainMenu],

            Decision::Declare(status) => match self.store.set(key, status).await {
                Ok(()) => {
                    log::info!("📌 Chat {} declared {}", key, status);
                    vec![Reply::RequestLocation]
                }
                Err(e) => {
                    log::error!("❌ Failed to save status {} for chat {}: {}", status, key, e);
                    vec![Reply::StorageFailed, Reply::MainMenu]
                }
            },

            Decision::RejectText => {
                log::warn!("Chat {}: text is not a status keyword", key);
                vec![Reply::KeywordsOnly]
            }

            Decision::ChooseStatusFirst => {
                log::warn!("Chat {}: location without a declared status", key);
                vec![Reply::ChooseStatusFirst, Reply::MainMenu]
            }

            Decision::Record { status, location } => {
                let record = AttendanceRecord::new(sender, location, status, at);
                match self.writer.write(&record).await {
                    Ok(_) => self.clear(key).await,
                    // строка уже в таблице, повторять нельзя: будет дубль
                    Err(e) if e.row_was_appended() => {
                        log::error!("⚠️ Chat {}: row recorded incomplete: {}", key, e);
                        self.clear(key).await
                    }
                    Err(e) => {
                        log::error!("❌ Chat {}: attendance not recorded: {}", key, e);
                        vec![Reply::WriteFailed, Reply::RequestLocation]
                    }
                }
            }
        }
    }

    async fn clear(&self, key: &str) -> Vec<Reply> {
        match self.store.remove(key).await {
            Ok(_) => vec![Reply::Recorded, Reply::MainMenu],
            Err(e) => {
                log::error!("❌ Recorded, but failed to clear status for chat {}: {}", key, e);
                vec![Reply::Recorded, Reply::StorageFailed, Reply::MainMenu]
            }
        }
    }

    async fn chat_lock(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.chat_locks.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }

        let mut locks = self.chat_locks.write().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Убирает замок чата, если его больше никто не держит и не ждёт.
    async fn release_chat_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.chat_locks.write().await;
        // одна ссылка в карте, вторая наша
        let ours = locks.get(key).is_some_and(|held| Arc::ptr_eq(held, &lock));
        if ours && Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}
