use std::collections::HashMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{StatusStore, StoreError};
use crate::models::AttendanceStatus;

/// JSON-файл вида `{"<chat id>": "Keldim"}`, загружается один раз при старте.
///
/// Мутация сначала пишет новое отображение во временный файл и
/// переименовывает его поверх основного, и только потом меняет память.
/// При ошибке записи и память, и файл остаются в прежнем состоянии.
pub struct JsonFileStatusStore {
    path: PathBuf,
    statuses: Mutex<HashMap<String, AttendanceStatus>>,
}

impl JsonFileStatusStore {
    /// Отсутствующий, нечитаемый или битый файл даёт пустое состояние.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let statuses = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, AttendanceStatus>>(&bytes) {
                Ok(statuses) => statuses,
                Err(e) => {
                    log::warn!("⚠️ Status file {} is corrupt, starting empty: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No status file at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => {
                log::warn!("⚠️ Cannot read status file {}, starting empty: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path,
            statuses: Mutex::new(statuses),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, statuses: &HashMap<String, AttendanceStatus>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(statuses)?;
        let tmp = temp_path(&self.path);
        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        sync_parent(&self.path).await;
        Ok(())
    }
}

/// Пишет и сбрасывает на диск до переименования.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Фиксирует сам rename. Не везде каталог можно открыть, поэтому без ошибки.
async fn sync_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    match fs::File::open(parent).await {
        Ok(dir) => {
            if let Err(e) = dir.sync_all().await {
                log::debug!("Cannot sync directory {}: {}", parent.display(), e);
            }
        }
        Err(e) => log::debug!("Cannot open directory {}: {}", parent.display(), e),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("user_status.json"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl StatusStore for JsonFileStatusStore {
    async fn get(&self, chat_id: &str) -> Option<AttendanceStatus> {
        self.statuses.lock().await.get(chat_id).copied()
    }

    async fn set(&self, chat_id: &str, status: AttendanceStatus) -> Result<(), StoreError> {
        let mut statuses = self.statuses.lock().await;
        let mut next = statuses.clone();
        next.insert(chat_id.to_string(), status);
        self.persist(&next).await?;
        *statuses = next;
        Ok(())
    }

    async fn remove(&self, chat_id: &str) -> Result<Option<AttendanceStatus>, StoreError> {
        let mut statuses = self.statuses.lock().await;
        if !statuses.contains_key(chat_id) {
            return Ok(None);
        }
        let mut next = statuses.clone();
        let removed = next.remove(chat_id);
        self.persist(&next).await?;
        *statuses = next;
        Ok(removed)
    }

    async fn len(&self) -> usize {
        self.statuses.lock().await.len()
    }
}
