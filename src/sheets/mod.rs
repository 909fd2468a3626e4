//! Удалённая таблица: добавление строки, подсчёт строк, запись ячейки.

mod auth;
mod google;
#[cfg(test)]
pub mod memory;

pub use auth::ServiceAccountKey;
pub use google::GoogleSheet;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Раскладка колонок (с 1).
pub const TIMESTAMP_COLUMN: usize = 1;
pub const DISPLAY_NAME_COLUMN: usize = 2;
pub const USERNAME_COLUMN: usize = 3;
pub const USER_ID_COLUMN: usize = 4;
pub const LATITUDE_COLUMN: usize = 5;
pub const LONGITUDE_COLUMN: usize = 6;
pub const LOCATION_COLUMN: usize = 7;
pub const ROW_WIDTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP middleware failed: {0}")]
    Middleware(#[from] reqwest_middleware::Error),
    #[error("{context} failed: {status} - {body}")]
    Status {
        context: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("service account authentication failed: {0}")]
    Auth(String),
    #[error("spreadsheet {0:?} not found or not shared with the service account")]
    NotFound(String),
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote store rejected the call: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn append_row(&self, values: Vec<CellValue>) -> Result<(), SheetError>;

    /// Количество непустых строк листа после всех добавлений.
    async fn row_count(&self) -> Result<usize, SheetError>;

    /// `row` и `column` считаются с 1.
    async fn set_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), SheetError>;
}

/// Пропускает успешный ответ, иначе логирует тело и возвращает `Status`.
pub(crate) async fn checked(
    response: reqwest::Response,
    context: &'static str,
) -> Result<reqwest::Response, SheetError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    log::error!("❌ Google API {} failed: {} - {}", context, status, body);
    Err(SheetError::Status {
        context,
        status,
        body,
    })
}

/// Буквенное имя колонки A1-нотации: 1 -> A, 27 -> AA.
pub fn column_letter(column: usize) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
