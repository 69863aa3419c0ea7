// src/services/store.rs
//
// Store - the five cache slices plus their persistence.
//
// Lifecycle:
// 1. Store::new() - slices empty, persist gate closed, writes dropped
// 2. rehydrate() - stored snapshots restored (status Idle), gate opened
// 3. normal operation - every applied fetch queues a snapshot write
//
// Snapshots are best effort: a missing, unreadable or outdated snapshot
// leaves its slice empty, it never fails startup.

use std::sync::Arc;

use serde::Serialize;

use super::persist_gate::PersistGate;
use super::persistor::{Persistor, SNAPSHOT_VERSION};
use super::slice::{PersistedSlice, Slice};
use super::slices::{CircuitSlice, ConstructorSlice, DriverSlice, ResultSlice, ScheduleSlice};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, StorePurged, StoreRehydrated};
use crate::integrations::F1Gateway;
use crate::repositories::{SnapshotRepository, StoredSnapshot};

/// Which slices rehydration could restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RehydrationReport {
    pub restored: Vec<String>,
    /// Nothing stored yet.
    pub missing: Vec<String>,
    /// Stored but unreadable, unparseable or written by another version.
    pub discarded: Vec<String>,
}

pub struct Store {
    schedule: Slice<ScheduleSlice>,
    drivers: Slice<DriverSlice>,
    constructors: Slice<ConstructorSlice>,
    circuits: Slice<CircuitSlice>,
    results: Slice<ResultSlice>,
    persistor: Persistor,
    gate: PersistGate,
    repository: Arc<dyn SnapshotRepository>,
    event_bus: Arc<EventBus>,
}

impl Store {
    /// Build the store and spawn its snapshot writer. Must be called from
    /// within a Tokio runtime.
    pub fn new(
        gateway: Arc<dyn F1Gateway>,
        repository: Arc<dyn SnapshotRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let gate = PersistGate::new();
        let persistor = Persistor::spawn(
            Arc::clone(&repository),
            gate.clone(),
            Arc::clone(&event_bus),
        );

        let schedule = Slice::new(
            ScheduleSlice,
            Arc::clone(&gateway),
            persistor.clone(),
            Arc::clone(&event_bus),
        );
        let drivers = Slice::new(
            DriverSlice,
            Arc::clone(&gateway),
            persistor.clone(),
            Arc::clone(&event_bus),
        );
        let constructors = Slice::new(
            ConstructorSlice,
            Arc::clone(&gateway),
            persistor.clone(),
            Arc::clone(&event_bus),
        );
        let circuits = Slice::new(
            CircuitSlice,
            Arc::clone(&gateway),
            persistor.clone(),
            Arc::clone(&event_bus),
        );
        let results = Slice::new(ResultSlice, gateway, persistor.clone(), Arc::clone(&event_bus));

        Self {
            schedule,
            drivers,
            constructors,
            circuits,
            results,
            persistor,
            gate,
            repository,
            event_bus,
        }
    }

    pub fn schedule(&self) -> &Slice<ScheduleSlice> {
        &self.schedule
    }

    pub fn drivers(&self) -> &Slice<DriverSlice> {
        &self.drivers
    }

    pub fn constructors(&self) -> &Slice<ConstructorSlice> {
        &self.constructors
    }

    pub fn circuits(&self) -> &Slice<CircuitSlice> {
        &self.circuits
    }

    pub fn results(&self) -> &Slice<ResultSlice> {
        &self.results
    }

    pub fn persist_gate(&self) -> &PersistGate {
        &self.gate
    }

    fn persisted_slices(&self) -> [&dyn PersistedSlice; 5] {
        [
            &self.schedule,
            &self.drivers,
            &self.constructors,
            &self.circuits,
            &self.results,
        ]
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Restore every slice from storage, then open the persist gate.
    pub async fn rehydrate(&self) -> RehydrationReport {
        let slices = self.persisted_slices();
        let keys: Vec<String> = slices.iter().map(|s| s.storage_key()).collect();

        let repo = Arc::clone(&self.repository);
        let stored = tokio::task::spawn_blocking(move || {
            keys.into_iter()
                .map(|key| repo.get(&key))
                .collect::<Vec<AppResult<Option<StoredSnapshot>>>>()
        })
        .await
        .unwrap_or_else(|e| {
            let err = AppError::from(e);
            (0..slices.len())
                .map(|_| Err(AppError::Other(err.to_string())))
                .collect()
        });

        let mut report = RehydrationReport::default();
        for (slice, entry) in slices.iter().zip(stored) {
            let name = slice.name().to_string();
            match entry {
                Ok(None) => report.missing.push(name),
                Ok(Some(snapshot)) if snapshot.version != SNAPSHOT_VERSION => {
                    log::warn!(
                        "discarding {} snapshot: version {} (expected {})",
                        name,
                        snapshot.version,
                        SNAPSHOT_VERSION
                    );
                    report.discarded.push(name);
                }
                Ok(Some(snapshot)) => match slice.restore_snapshot(&snapshot.payload) {
                    Ok(()) => report.restored.push(name),
                    Err(e) => {
                        log::warn!("discarding unreadable {} snapshot: {}", name, e);
                        report.discarded.push(name);
                    }
                },
                Err(e) => {
                    log::warn!("could not read {} snapshot: {}", name, e);
                    report.discarded.push(name);
                }
            }
        }

        self.gate.open();
        log::info!(
            "store rehydrated: {} restored, {} missing, {} discarded",
            report.restored.len(),
            report.missing.len(),
            report.discarded.len()
        );
        self.event_bus.emit(StoreRehydrated::new(
            report.restored.clone(),
            report.missing.clone(),
            report.discarded.clone(),
        ));
        report
    }

    /// Wait for every queued snapshot write.
    pub async fn flush(&self) {
        self.persistor.flush().await;
    }

    /// Delete every stored snapshot. In-memory slices are left as they are.
    pub async fn purge(&self) -> AppResult<usize> {
        let removed = self.persistor.purge().await?;
        log::info!("purged {} stored snapshots", removed);
        self.event_bus.emit(StorePurged::new(removed));
        Ok(removed)
    }

    /// Empty every slice (and its stored snapshot).
    pub fn reset_all(&self) {
        self.schedule.reset();
        self.drivers.reset();
        self.constructors.reset();
        self.circuits.reset();
        self.results.reset();
    }
}
