//! MySQL repository

use crate::{Record, RecordStore, StorageError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{Connection, FromRow};
use tracing::{debug, info, warn};

const SELECT_RECORDS: &str =
    "SELECT id, device_name, voltage, record_date FROM voltage_logs ORDER BY id DESC";

const INSERT_RECORD: &str =
    "INSERT INTO voltage_logs (device_name, voltage, record_date) VALUES (?, ?, ?)";

/// Repository backed by the `voltage_logs` table.
///
/// Connections come from an sqlx pool shared by every request; the pool
/// serialises use of each physical connection.
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Open a pool and ping the server once.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(unavailable)?;

        let repository = Self::from_pool(pool);
        repository.ping().await?;
        info!("Connected to MySQL (max {} connections)", max_connections);

        Ok(repository)
    }

    /// Wrap an existing pool
    fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for MySqlRepository {
    async fn list_records(&self) -> Result<Vec<Record>, StorageError> {
        let rows = sqlx::query(SELECT_RECORDS)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match Record::from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping undecodable voltage_logs row: {}", e),
            }
        }

        Ok(records)
    }

    async fn append_record(
        &self,
        device_name: &str,
        voltage: &str,
        record_date: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(INSERT_RECORD)
            .bind(device_name)
            .bind(voltage)
            .bind(record_date)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;

        debug!("Inserted voltage record with ID {}", result.last_insert_id());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await.map_err(unavailable)?;
        conn.ping().await.map_err(unavailable)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("MySQL pool closed");
    }
}

fn unavailable(err: sqlx::Error) -> StorageError {
    StorageError::Unavailable(err.to_string())
}
