// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic (snapshot versions are checked by the store, not here)
// - NO event emission
// - Explicit SQL only

pub mod snapshot_repository;

pub use snapshot_repository::{SnapshotRepository, SqliteSnapshotRepository, StoredSnapshot};
