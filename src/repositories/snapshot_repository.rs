// src/repositories/snapshot_repository.rs
//
// Durable key/value storage for persisted snapshots.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

use crate::db::{get_connection, ConnectionPool};
use crate::error::AppResult;

/// One stored entry: a JSON payload plus the snapshot format version it was
/// written with.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub storage_key: String,
    pub version: u32,
    pub payload: String,
    pub updated_at: DateTime<Utc>,
}

pub trait SnapshotRepository: Send + Sync {
    /// Insert or overwrite the entry under `storage_key`.
    fn save(&self, storage_key: &str, version: u32, payload: &str) -> AppResult<()>;
    fn get(&self, storage_key: &str) -> AppResult<Option<StoredSnapshot>>;
    fn delete(&self, storage_key: &str) -> AppResult<()>;
    fn list_keys(&self) -> AppResult<Vec<String>>;
    /// Remove every entry whose key starts with `prefix`, returning how
    /// many were removed.
    fn delete_with_prefix(&self, prefix: &str) -> AppResult<usize>;
}

pub struct SqliteSnapshotRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_snapshot(row: &Row) -> Result<StoredSnapshot, rusqlite::Error> {
        let updated_at_str: String = row.get("updated_at")?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(StoredSnapshot {
            storage_key: row.get("storage_key")?,
            version: row.get("version")?,
            payload: row.get("payload")?,
            updated_at,
        })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn save(&self, storage_key: &str, version: u32, payload: &str) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;

        conn.execute(
            "INSERT INTO persisted_snapshots (storage_key, version, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(storage_key) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                updated_at = excluded.updated_at",
            params![storage_key, version, payload, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn get(&self, storage_key: &str) -> AppResult<Option<StoredSnapshot>> {
        let conn = get_connection(&self.pool)?;

        let snapshot = conn
            .query_row(
                "SELECT storage_key, version, payload, updated_at
                 FROM persisted_snapshots WHERE storage_key = ?1",
                params![storage_key],
                Self::row_to_snapshot,
            )
            .optional()?;

        Ok(snapshot)
    }

    fn delete(&self, storage_key: &str) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            "DELETE FROM persisted_snapshots WHERE storage_key = ?1",
            params![storage_key],
        )?;
        Ok(())
    }

    fn list_keys(&self) -> AppResult<Vec<String>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt =
            conn.prepare("SELECT storage_key FROM persisted_snapshots ORDER BY storage_key")?;

        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(keys)
    }

    fn delete_with_prefix(&self, prefix: &str) -> AppResult<usize> {
        let conn = get_connection(&self.pool)?;
        let removed = conn.execute(
            "DELETE FROM persisted_snapshots
             WHERE substr(storage_key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_connection_pool, initialize_database};

    fn repository() -> (tempfile::TempDir, SqliteSnapshotRepository) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_connection_pool(&dir.path().join("test.db")).unwrap();
        initialize_database(&pool.get().unwrap()).unwrap();
        (dir, SqliteSnapshotRepository::new(Arc::new(pool)))
    }

    #[test]
    fn test_save_and_get() {
        let (_dir, repo) = repository();

        repo.save("persist:schedule", 1, r#"{"races":[]}"#).unwrap();
        let stored = repo.get("persist:schedule").unwrap().unwrap();

        assert_eq!(stored.storage_key, "persist:schedule");
        assert_eq!(stored.version, 1);
        assert_eq!(stored.payload, r#"{"races":[]}"#);
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, repo) = repository();

        repo.save("persist:drivers", 1, r#"{"drivers":[]}"#).unwrap();
        repo.save("persist:drivers", 1, r#"{"drivers":[{"driverId":"albon"}]}"#)
            .unwrap();

        let stored = repo.get("persist:drivers").unwrap().unwrap();
        assert!(stored.payload.contains("albon"));
        assert_eq!(repo.list_keys().unwrap(), vec!["persist:drivers".to_string()]);
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, repo) = repository();
        assert!(repo.get("persist:nothing").unwrap().is_none());
    }

    #[test]
    fn test_delete_and_delete_with_prefix() {
        let (_dir, repo) = repository();

        repo.save("persist:schedule", 1, "{}").unwrap();
        repo.save("persist:driver", 1, "{}").unwrap();
        repo.save("persist:result", 1, "{}").unwrap();
        repo.save("f1insight_user", 1, "{}").unwrap();

        repo.delete("persist:schedule").unwrap();
        assert_eq!(repo.list_keys().unwrap().len(), 3);

        assert_eq!(repo.delete_with_prefix("persist:").unwrap(), 2);
        assert_eq!(repo.list_keys().unwrap(), vec!["f1insight_user".to_string()]);
    }
}
