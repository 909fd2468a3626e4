//! Таблица в памяти для тестов: считает вызовы и умеет падать по команде.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CellValue, SheetError, SheetStore};

#[derive(Default)]
pub struct InMemorySheet {
    rows: Mutex<Vec<Vec<CellValue>>>,
    pub fail_append: AtomicBool,
    pub fail_row_count: AtomicBool,
    pub fail_set_cell: AtomicBool,
    pub append_calls: AtomicUsize,
    pub set_cell_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Каждый вызов будет «висеть» столько времени.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        self.rows.lock().unwrap().clone()
    }

    pub fn push_existing_row(&self, row: Vec<CellValue>) {
        self.rows.lock().unwrap().push(row);
    }

    async fn maybe_wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SheetStore for InMemorySheet {
    async fn append_row(&self, values: Vec<CellValue>) -> Result<(), SheetError> {
        self.maybe_wait().await;
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(SheetError::Rejected("append disabled".into()));
        }
        self.rows.lock().unwrap().push(values);
        Ok(())
    }

    async fn row_count(&self) -> Result<usize, SheetError> {
        self.maybe_wait().await;
        if self.fail_row_count.load(Ordering::SeqCst) {
            return Err(SheetError::Rejected("row count disabled".into()));
        }
        Ok(self.rows.lock().unwrap().len())
    }

    async fn set_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), SheetError> {
        self.maybe_wait().await;
        self.set_cell_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_set_cell.load(Ordering::SeqCst) {
            return Err(SheetError::Rejected("set cell disabled".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let target = rows
            .get_mut(row.wrapping_sub(1))
            .ok_or_else(|| SheetError::Rejected(format!("no row {}", row)))?;
        if target.len() < column {
            target.resize(column, CellValue::empty());
        }
        target[column - 1] = value;
        Ok(())
    }
}
