//! Хранилище отложенных статусов: chat id -> заявленный статус.
//!
//! Каждая мутация переписывает всё отображение целиком. Это допустимо,
//! пока одновременно открытых заявок немного (десятки, не тысячи).

mod file;
#[cfg(test)]
mod memory;

pub use file::JsonFileStatusStore;
#[cfg(test)]
pub use memory::InMemoryStatusStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::AttendanceStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("status file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("status file serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get(&self, chat_id: &str) -> Option<AttendanceStatus>;

    /// Upsert. Возвращает Ok только после записи на диск.
    async fn set(&self, chat_id: &str, status: AttendanceStatus) -> Result<(), StoreError>;

    /// Удаляет запись и сохраняет результат. Отсутствие записи не ошибка.
    async fn remove(&self, chat_id: &str) -> Result<Option<AttendanceStatus>, StoreError>;

    async fn len(&self) -> usize;
}
