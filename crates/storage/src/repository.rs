//! Record model and in-memory repository

use crate::{RecordStore, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info};

/// Voltage log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub device_name: String,
    pub voltage: i64,
    pub record_date: String,
}

/// In-memory repository with the same contract as the MySQL one
pub struct MemoryRepository {
    /// Records in insertion order
    records: Mutex<Vec<Record>>,
    /// Next record ID
    next_id: Mutex<i64>,
}

impl MemoryRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            records: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Insert a record, returning its assigned ID
    ///
    /// The voltage text is converted the way an `INT` column would: surrounding
    /// whitespace is ignored, anything else that is not an integer is rejected.
    pub fn insert(
        &self,
        device_name: &str,
        voltage: &str,
        record_date: &str,
    ) -> Result<i64, StorageError> {
        let voltage: i64 = voltage.trim().parse().map_err(|_| {
            StorageError::Write(format!(
                "Incorrect integer value: '{}' for column 'voltage'",
                voltage
            ))
        })?;

        let mut records = self.records.lock().map_err(|e| {
            StorageError::Unavailable(format!("Lock error: {}", e))
        })?;

        let mut id = self.next_id.lock().map_err(|e| {
            StorageError::Unavailable(format!("Lock error: {}", e))
        })?;

        let record = Record {
            id: *id,
            device_name: device_name.to_string(),
            voltage,
            record_date: record_date.to_string(),
        };
        *id += 1;

        let returned_id = record.id;
        records.push(record);
        debug!("Inserted voltage record with ID {}", returned_id);

        Ok(returned_id)
    }

    /// Get all records, newest first
    pub fn records(&self) -> Result<Vec<Record>, StorageError> {
        let records = self.records.lock().map_err(|e| {
            StorageError::Unavailable(format!("Lock error: {}", e))
        })?;

        Ok(records.iter().rev().cloned().collect())
    }

    /// Get total record count
    pub fn len(&self) -> Result<usize, StorageError> {
        self.records
            .lock()
            .map(|r| r.len())
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.len().map(|n| n == 0)
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRepository {
    async fn list_records(&self) -> Result<Vec<Record>, StorageError> {
        self.records()
    }

    async fn append_record(
        &self,
        device_name: &str,
        voltage: &str,
        record_date: &str,
    ) -> Result<(), StorageError> {
        self.insert(device_name, voltage, record_date).map(|_| ())
    }
}
