use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StatusStore, StoreError};
use crate::models::AttendanceStatus;

/// Хранилище без диска: всё теряется при рестарте.
#[derive(Default)]
pub struct InMemoryStatusStore {
    statuses: RwLock<HashMap<String, AttendanceStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn get(&self, chat_id: &str) -> Option<AttendanceStatus> {
        self.statuses.read().await.get(chat_id).copied()
    }

    async fn set(&self, chat_id: &str, status: AttendanceStatus) -> Result<(), StoreError> {
        self.statuses.write().await.insert(chat_id.to_string(), status);
        Ok(())
    }

    async fn remove(&self, chat_id: &str) -> Result<Option<AttendanceStatus>, StoreError> {
        Ok(self.statuses.write().await.remove(chat_id))
    }

    async fn len(&self) -> usize {
        self.statuses.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = InMemoryStatusStore::new();
        assert_eq!(store.get("42").await, None);

        store.set("42", AttendanceStatus::Arrived).await.unwrap();
        store.set("42", AttendanceStatus::Departed).await.unwrap();
        assert_eq!(store.get("42").await, Some(AttendanceStatus::Departed));
        assert_eq!(store.len().await, 1);

        assert_eq!(store.remove("42").await.unwrap(), Some(AttendanceStatus::Departed));
        assert_eq!(store.remove("42").await.unwrap(), None);
        assert_eq!(store.len().await, 0);
    }
}
