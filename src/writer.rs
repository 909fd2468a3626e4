//! Двухфазная запись отметки: добавить строку с заглушкой, затем
//! дописать формулы времени и ссылки. Таблица не транзакционна, поэтому
//! сбой второй фазы оставляет строку с `TEMP` и/или пустой ссылкой.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::models::AttendanceRecord;
use crate::sheets::{
    CellValue, SheetError, SheetStore, DISPLAY_NAME_COLUMN, LATITUDE_COLUMN, LOCATION_COLUMN,
    LONGITUDE_COLUMN, ROW_WIDTH, TIMESTAMP_COLUMN, USERNAME_COLUMN, USER_ID_COLUMN,
};

pub const TIMESTAMP_PLACEHOLDER: &str = "TEMP";

#[derive(Debug, Error)]
pub enum WriteError {
    /// Строка не добавлена, в таблице ничего нет.
    #[error("append failed, nothing was written: {0}")]
    Append(#[source] SheetError),
    /// Строка добавлена, но формулы не дописаны.
    #[error("row {row:?} was appended but not completed: {source}")]
    Partial {
        row: Option<usize>,
        #[source]
        source: SheetError,
    },
}

impl WriteError {
    pub fn row_was_appended(&self) -> bool {
        matches!(self, WriteError::Partial { .. })
    }
}

pub struct RecordWriter {
    sheet: Arc<dyn SheetStore>,
    timeout: Duration,
}

impl RecordWriter {
    pub fn new(sheet: Arc<dyn SheetStore>, timeout: Duration) -> Self {
        Self { sheet, timeout }
    }

    /// Возвращает номер записанной строки.
    ///
    /// Номер берётся из количества строк после добавления, а не из ответа
    /// на append: предполагается единственный писатель в таблицу.
    pub async fn write(&self, record: &AttendanceRecord) -> Result<usize, WriteError> {
        let attempt = Uuid::new_v4();
        log::info!(
            "📝 [{}] Appending {} row for user {}",
            attempt,
            record.status,
            record.user_id
        );

        self.call(self.sheet.append_row(placeholder_row(record)))
            .await
            .map_err(|e| {
                log::error!("❌ [{}] Append failed, nothing written: {}", attempt, e);
                WriteError::Append(e)
            })?;

        let row = self.call(self.sheet.row_count()).await.map_err(|e| {
            log::error!("❌ [{}] Row appended but its index is unknown: {}", attempt, e);
            WriteError::Partial { row: None, source: e }
        })?;

        // обе ячейки пробуем независимо, отдаём первую ошибку
        let timestamp = self
            .call(self.sheet.set_cell(
                row,
                TIMESTAMP_COLUMN,
                CellValue::Text(record.timestamp_formula()),
            ))
            .await;
        let link = self
            .call(self.sheet.set_cell(
                row,
                LOCATION_COLUMN,
                CellValue::Text(record.location_formula()),
            ))
            .await;

        match timestamp.and(link) {
            Ok(()) => {
                log::info!("✅ [{}] Row {} completed", attempt, row);
                Ok(row)
            }
            Err(e) => {
                log::error!("❌ [{}] Row {} left incomplete: {}", attempt, row, e);
                Err(WriteError::Partial { row: Some(row), source: e })
            }
        }
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, SheetError>>,
    ) -> Result<T, SheetError> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| SheetError::Timeout(self.timeout))?
    }
}

/// Строка первой фазы: `TEMP` вместо времени и пустая ссылка.
fn placeholder_row(record: &AttendanceRecord) -> Vec<CellValue> {
    let mut row = vec![CellValue::empty(); ROW_WIDTH];
    row[TIMESTAMP_COLUMN - 1] = CellValue::text(TIMESTAMP_PLACEHOLDER);
    row[DISPLAY_NAME_COLUMN - 1] = CellValue::text(record.display_name.as_str());
    row[USERNAME_COLUMN - 1] = CellValue::text(record.username.as_str());
    row[USER_ID_COLUMN - 1] = CellValue::Integer(record.user_id);
    row[LATITUDE_COLUMN - 1] = CellValue::Number(record.latitude);
    row[LONGITUDE_COLUMN - 1] = CellValue::Number(record.longitude);
    row
}
