// src/db/connection.rs
//
// Database connection management
//
// The database is the durable store behind slice persistence: one small
// key/value table, written by the background persistor and read once at
// rehydration.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

const DATABASE_FILE: &str = "f1insight.db";

/// Get the database file path
///
/// `data_dir` overrides the platform data directory.
/// Path structure: {APP_DATA}/f1insight/f1insight.db
pub fn get_database_path(data_dir: Option<&Path>) -> AppResult<PathBuf> {
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .ok_or_else(|| AppError::Config("Could not determine app data directory".to_string()))?
            .join("f1insight"),
    };

    std::fs::create_dir_all(&dir)?;

    Ok(dir.join(DATABASE_FILE))
}

/// Create a connection pool for the database at `db_path`
///
/// Pool configuration:
/// - Small pool: one writer task plus occasional reads
/// - SQLite in WAL mode so the writer never blocks readers
/// - Busy timeout set to avoid immediate errors
pub fn create_connection_pool(db_path: &Path) -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// This is a convenience wrapper that provides better error messages.
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}
