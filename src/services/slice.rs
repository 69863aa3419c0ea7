// src/services/slice.rs
//
// Generic cache slice.
//
// A slice owns one entity's cached data plus the status of its latest
// request. The per-entity parts (which endpoint, how to merge, what counts
// as cached) come from a SliceKind; everything else lives here once.
//
// CRITICAL RULES:
// - Every fetch takes a new generation number; only the latest generation
//   may change status/error
// - A superseded response is dropped, except that upsert slices still fold
//   its payload in (it is valid data for a different key)
// - Only `Data` is persisted; status, error and last key never are
// - Lock guards are never held across an await
// - Snapshot writes are queued while the write lock is held, so storage
//   sees them in merge order

use std::fmt::{Debug, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use super::fetch_status::{FetchOutcome, FetchStatus};
use super::merge::MergeStrategy;
use super::persistor::{storage_key, Persistor};
use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, SliceFetchFailed, SliceFetchStarted, SliceFetchSucceeded, StaleResponseDiscarded,
};
use crate::integrations::F1Gateway;

/// Per-entity behavior of a slice.
#[async_trait]
pub trait SliceKind: Send + Sync + 'static {
    /// Slice name; also the suffix of its storage key.
    const NAME: &'static str;
    const STRATEGY: MergeStrategy;

    type Key: Clone + Debug + Display + PartialEq + Send + Sync + 'static;
    type Payload: Send + 'static;
    /// The persisted (whitelisted) part of the slice.
    type Data: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    async fn load(&self, gateway: &dyn F1Gateway, key: &Self::Key) -> AppResult<Self::Payload>;

    fn merge(&self, data: &mut Self::Data, key: &Self::Key, payload: Self::Payload);

    /// Message recorded when a request fails with an error that carries none.
    fn fallback_error(&self, key: &Self::Key) -> String;

    /// Whether `ensure(key)` can skip the request.
    fn is_cached(&self, state: &SliceState<Self::Data, Self::Key>, key: &Self::Key) -> bool {
        state.status == FetchStatus::Succeeded && state.last_key.as_ref() == Some(key)
    }
}

/// Snapshot of a slice as views see it.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<D, K> {
    pub data: D,
    pub status: FetchStatus,
    pub error: Option<String>,
    /// Key of the latest request that succeeded.
    pub last_key: Option<K>,
}

impl<D: Default, K> Default for SliceState<D, K> {
    fn default() -> Self {
        Self {
            data: D::default(),
            status: FetchStatus::Idle,
            error: None,
            last_key: None,
        }
    }
}

pub struct Slice<S: SliceKind> {
    kind: S,
    state: RwLock<SliceState<S::Data, S::Key>>,
    generation: AtomicU64,
    /// Latest generation whose outcome has been applied.
    applied: watch::Sender<u64>,
    gateway: Arc<dyn F1Gateway>,
    persistor: Persistor,
    event_bus: Arc<EventBus>,
}

impl<S: SliceKind> Slice<S> {
    pub fn new(
        kind: S,
        gateway: Arc<dyn F1Gateway>,
        persistor: Persistor,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            kind,
            state: RwLock::new(SliceState::default()),
            generation: AtomicU64::new(0),
            applied: watch::channel(0).0,
            gateway,
            persistor,
            event_bus,
        }
    }

    pub fn name(&self) -> &'static str {
        S::NAME
    }

    pub fn storage_key(&self) -> String {
        storage_key(S::NAME)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn state(&self) -> SliceState<S::Data, S::Key> {
        self.read().clone()
    }

    pub fn data(&self) -> S::Data {
        self.read().data.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.read().status
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Request `key` from the gateway and apply the outcome.
    pub async fn fetch(&self, key: S::Key) -> FetchOutcome {
        let generation = {
            let mut state = self.write();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.status = FetchStatus::Loading;
            state.error = None;
            generation
        };
        let _settle = SettleOnDrop { slice: self, generation };

        log::debug!("{}: fetching {} (generation {})", S::NAME, key, generation);
        self.event_bus
            .emit(SliceFetchStarted::new(S::NAME, key.to_string(), generation));

        let result = self.kind.load(self.gateway.as_ref(), &key).await;

        let mut state = self.write();
        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            let merged = match result {
                Ok(payload) if S::STRATEGY.keeps_stale_payload() => {
                    self.kind.merge(&mut state.data, &key, payload);
                    true
                }
                _ => false,
            };
            if merged {
                self.persistor.persist(&self.storage_key(), &state.data);
            }
            drop(state);

            log::debug!(
                "{}: response for {} superseded (generation {} < {})",
                S::NAME,
                key,
                generation,
                latest
            );
            self.event_bus.emit(StaleResponseDiscarded::new(
                S::NAME,
                key.to_string(),
                generation,
                latest,
                merged,
            ));
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(payload) => {
                self.kind.merge(&mut state.data, &key, payload);
                state.status = FetchStatus::Succeeded;
                state.error = None;
                state.last_key = Some(key.clone());
                self.persistor.persist(&self.storage_key(), &state.data);
                drop(state);

                self.event_bus
                    .emit(SliceFetchSucceeded::new(S::NAME, key.to_string()));
                FetchOutcome::Succeeded
            }
            Err(err) => {
                let message = failure_message(&err, || self.kind.fallback_error(&key));
                state.status = FetchStatus::Failed;
                state.error = Some(message.clone());
                drop(state);

                log::debug!("{}: fetching {} failed: {}", S::NAME, key, message);
                self.event_bus.emit(SliceFetchFailed::new(
                    S::NAME,
                    key.to_string(),
                    message.clone(),
                ));
                FetchOutcome::Failed(message)
            }
        }
    }

    /// Fetch `key` unless the slice already holds it.
    pub async fn ensure(&self, key: S::Key) -> FetchOutcome {
        let cached = {
            let state = self.read();
            self.kind.is_cached(&state, &key)
        };
        if cached {
            log::debug!("{}: {} already cached", S::NAME, key);
            return FetchOutcome::Skipped;
        }
        self.fetch(key).await
    }

    /// Whether the slice currently holds `key`'s data.
    pub fn holds(&self, key: &S::Key) -> bool {
        let state = self.read();
        self.kind.is_cached(&state, key)
    }

    /// Wait until the most recent request has been applied (or there is
    /// none in flight).
    pub async fn settled(&self) {
        let mut rx = self.applied.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx
            .wait_for(|applied| *applied >= self.generation.load(Ordering::SeqCst))
            .await;
    }

    /// Empty the slice and its stored snapshot. Responses still in flight
    /// become stale.
    pub fn reset(&self) {
        let generation = {
            let mut state = self.write();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = SliceState::default();
            self.persistor
                .persist(&self.storage_key(), &state.data);
            generation
        };
        self.mark_settled(generation);
    }

    /// Seed the slice from a stored snapshot. Status stays `Idle`.
    pub fn restore(&self, data: S::Data) {
        let mut state = self.write();
        state.data = data;
        state.status = FetchStatus::Idle;
        state.error = None;
        state.last_key = None;
    }

    fn mark_settled(&self, generation: u64) {
        self.applied.send_if_modified(|applied| {
            if generation > *applied {
                *applied = generation;
                true
            } else {
                false
            }
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, SliceState<S::Data, S::Key>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SliceState<S::Data, S::Key>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Object-safe view of a slice for rehydration.
pub trait PersistedSlice: Send + Sync {
    fn name(&self) -> &'static str;
    fn storage_key(&self) -> String;
    /// Parse `payload` and seed the slice with it.
    fn restore_snapshot(&self, payload: &str) -> AppResult<()>;
}

impl<S: SliceKind> PersistedSlice for Slice<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn storage_key(&self) -> String {
        Slice::storage_key(self)
    }

    fn restore_snapshot(&self, payload: &str) -> AppResult<()> {
        let data: S::Data = serde_json::from_str(payload)?;
        self.restore(data);
        Ok(())
    }
}

/// Marks a fetch's generation applied when the fetch ends, including when
/// its future is dropped mid-request.
struct SettleOnDrop<'a, S: SliceKind> {
    slice: &'a Slice<S>,
    generation: u64,
}

impl<S: SliceKind> Drop for SettleOnDrop<'_, S> {
    fn drop(&mut self) {
        self.slice.mark_settled(self.generation);
    }
}

/// The message a failed request leaves on the slice: the backend's own
/// message when it sent one, otherwise the error text, otherwise the
/// slice's fallback.
fn failure_message(err: &AppError, fallback: impl FnOnce() -> String) -> String {
    let message = match err {
        AppError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    };
    if message.trim().is_empty() {
        fallback()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_prefers_backend_message() {
        let err = AppError::Api {
            status: 500,
            message: "Ergast is down".into(),
            details: None,
        };
        assert_eq!(failure_message(&err, || "fallback".into()), "Ergast is down");
    }

    #[test]
    fn test_failure_message_not_found_is_bare() {
        let err = AppError::NotFound("Circuit not found".into());
        assert_eq!(failure_message(&err, || "fallback".into()), "Circuit not found");
    }

    #[test]
    fn test_failure_message_falls_back_when_empty() {
        let err = AppError::Api {
            status: 500,
            message: String::new(),
            details: None,
        };
        assert_eq!(
            failure_message(&err, || "Failed to fetch schedule".into()),
            "Failed to fetch schedule"
        );
    }
}
