use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Row, TableBackend};
use crate::error::LedgerError;

/// Process-local sheets. Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemorySheet {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, rows: Vec<Row>) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(table.to_string(), rows);
        }
        self
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::StoreUnavailable("memory sheet lock poisoned".into())
}

#[async_trait]
impl TableBackend for MemorySheet {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, LedgerError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    async fn replace_table(&self, table: &str, rows: Vec<Row>) -> Result<(), LedgerError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.insert(table.to_string(), rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn missing_table_reads_empty() {
        let sheet = MemorySheet::new();
        assert!(sheet.read_table("Attendance").await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn replace_overwrites_whole_table() {
        let row: Row = [("k".to_string(), "v".to_string())].into_iter().collect();
        let sheet = MemorySheet::new().with_table("T", vec![row.clone(), row.clone()]);
        sheet.replace_table("T", vec![row]).await.unwrap();
        assert_eq!(sheet.read_table("T").await.unwrap().len(), 1);
    }
}
