//! Offline queue repository implementation

use crate::error::{Error, Result};
use crate::models::{NewQueueRecord, QueueRecord, RecordId, SyncState};
use libsql::{params, Connection, Row};

const RECORD_COLUMNS: &str = "id, data, timestamp, synced";

/// Trait for queue record storage operations (async)
#[allow(async_fn_in_trait)]
pub trait QueueRepository {
    /// Persist a record and return the id the store assigned
    async fn insert(&self, record: &NewQueueRecord) -> Result<RecordId>;

    /// Get a record by id
    async fn get(&self, id: RecordId) -> Result<Option<QueueRecord>>;

    /// All records in the given state, in insertion order
    async fn get_by_state(&self, state: SyncState) -> Result<Vec<QueueRecord>>;

    /// Every record, in insertion order
    async fn list_all(&self) -> Result<Vec<QueueRecord>>;

    /// Replace a record's payload, timestamp and state
    async fn update(&self, record: &QueueRecord) -> Result<()>;

    /// Hard delete by id. Deleting a missing id is not an error.
    async fn delete(&self, id: RecordId) -> Result<()>;

    /// Count records in the given state
    async fn count_by_state(&self, state: SyncState) -> Result<u64>;

    /// Delete every record in the given state, returning how many were removed
    async fn delete_by_state(&self, state: SyncState) -> Result<u64>;

    /// Remove all records
    async fn clear(&self) -> Result<u64>;
}

/// libSQL implementation of `QueueRepository`
pub struct LibSqlQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a queue record from a database row
    fn parse_record(row: &Row) -> Result<QueueRecord> {
        let data: String = row.get(1)?;
        Ok(QueueRecord {
            id: row.get(0)?,
            payload: serde_json::from_str(&data)?,
            enqueued_at: row.get(2)?,
            sync_state: SyncState::from_db(row.get(3)?),
        })
    }

    async fn collect(mut rows: libsql::Rows) -> Result<Vec<QueueRecord>> {
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }
}

impl QueueRepository for LibSqlQueueRepository<'_> {
    async fn insert(&self, record: &NewQueueRecord) -> Result<RecordId> {
        let data = serde_json::to_string(&record.payload)?;

        let mut rows = self
            .conn
            .query(
                "INSERT INTO offline_queue (data, timestamp, synced) VALUES (?1, ?2, ?3) RETURNING id",
                params![data, record.enqueued_at, record.sync_state.as_db()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| Error::Database("insert did not return an id".to_string()))?;
        Ok(row.get(0)?)
    }

    async fn get(&self, id: RecordId) -> Result<Option<QueueRecord>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {RECORD_COLUMNS} FROM offline_queue WHERE id = ?1"),
                params![id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_state(&self, state: SyncState) -> Result<Vec<QueueRecord>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM offline_queue
                     WHERE synced = ?1
                     ORDER BY id ASC"
                ),
                params![state.as_db()],
            )
            .await?;
        Self::collect(rows).await
    }

    async fn list_all(&self) -> Result<Vec<QueueRecord>> {
        let rows = self
            .conn
            .query(
                &format!("SELECT {RECORD_COLUMNS} FROM offline_queue ORDER BY id ASC"),
                (),
            )
            .await?;
        Self::collect(rows).await
    }

    async fn update(&self, record: &QueueRecord) -> Result<()> {
        let data = serde_json::to_string(&record.payload)?;

        let changed = self
            .conn
            .execute(
                "UPDATE offline_queue SET data = ?1, timestamp = ?2, synced = ?3 WHERE id = ?4",
                params![
                    data,
                    record.enqueued_at,
                    record.sync_state.as_db(),
                    record.id
                ],
            )
            .await?;

        if changed == 0 {
            return Err(Error::NotFound(record.id));
        }
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.conn
            .execute("DELETE FROM offline_queue WHERE id = ?1", params![id])
            .await?;
        Ok(())
    }

    async fn count_by_state(&self, state: SyncState) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM offline_queue WHERE synced = ?1",
                params![state.as_db()],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn delete_by_state(&self, state: SyncState) -> Result<u64> {
        Ok(self
            .conn
            .execute(
                "DELETE FROM offline_queue WHERE synced = ?1",
                params![state.as_db()],
            )
            .await?)
    }

    async fn clear(&self) -> Result<u64> {
        Ok(self.conn.execute("DELETE FROM offline_queue", ()).await?)
    }
}
