//! Storage Layer
//!
//! Persistence for voltage log records. The server talks to a
//! [`RecordStore`] trait object so the MySQL repository can be swapped
//! for the in-memory one in tests.

mod mysql;
mod repository;

pub use mysql::MySqlRepository;
pub use repository::{MemoryRepository, Record};

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection or query failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Insert rejected, including column type coercion failures
    #[error("Store write failed: {0}")]
    Write(String),
}

/// Access to the `voltage_logs` table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, newest (highest id) first.
    async fn list_records(&self) -> Result<Vec<Record>, StorageError>;

    /// Append one record. The voltage is passed through as text and
    /// converted by the store.
    async fn append_record(
        &self,
        device_name: &str,
        voltage: &str,
        record_date: &str,
    ) -> Result<(), StorageError>;

    /// Round-trip check against the backend
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Release held connections
    async fn close(&self) {}
}
