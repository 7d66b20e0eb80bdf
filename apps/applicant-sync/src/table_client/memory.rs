//! In-memory `TableStore` used by the batch job tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Fields, Record, StoreError, TableStore};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    failing_tables: Mutex<HashSet<String>>,
    failing_records: Mutex<HashSet<String>>,
    next_id: Mutex<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record with a fixed id.
    pub fn insert(&self, table: &str, id: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(Record {
                id: id.to_string(),
                fields,
                created_time: None,
            });
    }

    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, table: &str, id: &str) -> Option<Record> {
        self.records(table).into_iter().find(|r| r.id == id)
    }

    /// Every subsequent call touching `table` fails with a 422.
    pub fn fail_table(&self, table: &str) {
        self.failing_tables
            .lock()
            .unwrap()
            .insert(table.to_string());
    }

    /// Updates addressed to `record_id` fail with a 422; other calls succeed.
    pub fn fail_record(&self, record_id: &str) {
        self.failing_records
            .lock()
            .unwrap()
            .insert(record_id.to_string());
    }

    fn check(&self, table: &str) -> Result<(), StoreError> {
        if self.failing_tables.lock().unwrap().contains(table) {
            return Err(StoreError::Api {
                status: 422,
                body: format!("{{\"error\":\"table {table} rejected the request\"}}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn list(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        self.check(table)?;
        Ok(self.records(table))
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        self.check(table)?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("recMem{next}")
        };
        let record = Record {
            id,
            fields,
            created_time: None,
        };
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: &str,
        record_id: &str,
        fields: Fields,
    ) -> Result<Record, StoreError> {
        self.check(table)?;
        if self.failing_records.lock().unwrap().contains(record_id) {
            return Err(StoreError::Api {
                status: 422,
                body: format!("{{\"error\":\"INVALID_VALUE\",\"id\":\"{record_id}\"}}"),
            });
        }
        let mut tables = self.tables.lock().unwrap();
        let record = tables
            .get_mut(table)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| StoreError::Api {
                status: 404,
                body: format!("{{\"error\":\"NOT_FOUND\",\"id\":\"{record_id}\"}}"),
            })?;
        record.fields.extend(fields);
        Ok(record.clone())
    }
}
