// src/services/persistor.rs
//
// Fire-and-forget snapshot writer.
//
// CRITICAL RULES:
// - persist() never blocks and never fails the caller
// - Writes run on a background task, in the order they were queued
// - Failures are logged at warn and emitted as SnapshotPersistFailed
// - Writes queued before rehydration completes are dropped (they would
//   overwrite the snapshot that is about to be restored)

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::persist_gate::PersistGate;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, SnapshotPersistFailed, SnapshotPersisted};
use crate::repositories::SnapshotRepository;

/// Format version written with every snapshot. A stored snapshot with any
/// other version is discarded on rehydration.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Prefix of every slice's storage key.
pub const STORAGE_KEY_PREFIX: &str = "persist:";

pub fn storage_key(slice: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, slice)
}

enum PersistCommand {
    Write { storage_key: String, payload: String },
    Flush(oneshot::Sender<()>),
    Purge(oneshot::Sender<AppResult<usize>>),
}

/// Handle to the background writer. Cheap to clone.
#[derive(Clone)]
pub struct Persistor {
    tx: mpsc::UnboundedSender<PersistCommand>,
    gate: PersistGate,
    event_bus: Arc<EventBus>,
}

impl Persistor {
    /// Spawn the writer task. Must be called from within a Tokio runtime.
    pub fn spawn(
        repository: Arc<dyn SnapshotRepository>,
        gate: PersistGate,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, repository, Arc::clone(&event_bus)));
        Self { tx, gate, event_bus }
    }

    /// Queue `data` for storage under `storage_key`.
    pub fn persist<T: Serialize>(&self, storage_key: &str, data: &T) {
        if !self.gate.is_open() {
            log::debug!("dropping write to {} before rehydration", storage_key);
            return;
        }

        let payload = match serde_json::to_string(data) {
            Ok(payload) => payload,
            Err(e) => {
                self.report_failure(storage_key, &AppError::from(e));
                return;
            }
        };

        let command = PersistCommand::Write {
            storage_key: storage_key.to_string(),
            payload,
        };
        if self.tx.send(command).is_err() {
            self.report_failure(
                storage_key,
                &AppError::Other("snapshot writer has stopped".to_string()),
            );
        }
    }

    /// Wait until every write queued so far has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Delete every stored slice snapshot after the writes queued so far.
    pub async fn purge(&self) -> AppResult<usize> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(PersistCommand::Purge(done_tx))
            .map_err(|_| AppError::Other("snapshot writer has stopped".to_string()))?;
        done_rx
            .await
            .map_err(|_| AppError::Other("snapshot writer dropped the purge".to_string()))?
    }

    fn report_failure(&self, storage_key: &str, err: &AppError) {
        log::warn!("failed to persist {}: {}", storage_key, err);
        self.event_bus
            .emit(SnapshotPersistFailed::new(storage_key.to_string(), err.to_string()));
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
    repository: Arc<dyn SnapshotRepository>,
    event_bus: Arc<EventBus>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            PersistCommand::Write {
                storage_key,
                payload,
            } => {
                let bytes = payload.len();
                let repo = Arc::clone(&repository);
                let key = storage_key.clone();
                let result = tokio::task::spawn_blocking(move || {
                    repo.save(&key, SNAPSHOT_VERSION, &payload)
                })
                .await
                .map_err(AppError::from)
                .and_then(|r| r);

                match result {
                    Ok(()) => {
                        log::debug!("persisted {} ({} bytes)", storage_key, bytes);
                        event_bus.emit(SnapshotPersisted::new(storage_key, bytes));
                    }
                    Err(e) => {
                        log::warn!("failed to persist {}: {}", storage_key, e);
                        event_bus.emit(SnapshotPersistFailed::new(storage_key, e.to_string()));
                    }
                }
            }
            PersistCommand::Flush(done) => {
                let _ = done.send(());
            }
            PersistCommand::Purge(done) => {
                let repo = Arc::clone(&repository);
                let result =
                    tokio::task::spawn_blocking(move || repo.delete_with_prefix(STORAGE_KEY_PREFIX))
                    .await
                    .map_err(AppError::from)
                    .and_then(|r| r);
                let _ = done.send(result);
            }
        }
    }

    log::debug!("snapshot writer stopped");
}
