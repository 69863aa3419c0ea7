// src/services/merge.rs

/// How a slice folds a fetched payload into what it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// The payload replaces the slice's collection for the new key.
    Replace,
    /// The payload is inserted (or overwritten) under a compound key and
    /// every other entry is kept.
    UpsertByCompoundKey,
}

impl MergeStrategy {
    /// A late response for a different key still carries valid data for an
    /// upsert slice, so it is folded in. Replace slices drop it.
    pub fn keeps_stale_payload(&self) -> bool {
        matches!(self, MergeStrategy::UpsertByCompoundKey)
    }
}
