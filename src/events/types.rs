// src/events/types.rs
//
// Events emitted by the client data layer.
// Each event is an immutable fact about something that already happened:
// a fetch transition, a snapshot write, a session change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! impl_domain_event {
    ($ty:ident) => {
        impl DomainEvent for $ty {
            fn event_id(&self) -> Uuid { self.event_id }
            fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
            fn event_type(&self) -> &'static str { stringify!($ty) }
        }
    };
}

// ============================================================================
// SLICE FETCH EVENTS
// ============================================================================

/// Emitted when a slice issues a request to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceFetchStarted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub slice: String,
    pub key: String,
    pub generation: u64,
}

impl SliceFetchStarted {
    pub fn new(slice: &str, key: String, generation: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            slice: slice.to_string(),
            key,
            generation,
        }
    }
}

impl_domain_event!(SliceFetchStarted);

/// Emitted when the latest request of a slice succeeds and its data is applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceFetchSucceeded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub slice: String,
    pub key: String,
}

impl SliceFetchSucceeded {
    pub fn new(slice: &str, key: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            slice: slice.to_string(),
            key,
        }
    }
}

impl_domain_event!(SliceFetchSucceeded);

/// Emitted when the latest request of a slice fails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceFetchFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub slice: String,
    pub key: String,
    pub message: String,
}

impl SliceFetchFailed {
    pub fn new(slice: &str, key: String, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            slice: slice.to_string(),
            key,
            message,
        }
    }
}

impl_domain_event!(SliceFetchFailed);

/// Emitted when a response arrives after a newer request was issued
/// for the same slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleResponseDiscarded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub slice: String,
    pub key: String,
    pub generation: u64,
    pub latest_generation: u64,
    /// Upsert slices still fold the payload in; status is left alone.
    pub payload_merged: bool,
}

impl StaleResponseDiscarded {
    pub fn new(
        slice: &str,
        key: String,
        generation: u64,
        latest_generation: u64,
        payload_merged: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            slice: slice.to_string(),
            key,
            generation,
            latest_generation,
            payload_merged,
        }
    }
}

impl_domain_event!(StaleResponseDiscarded);

// ============================================================================
// PERSISTENCE EVENTS
// ============================================================================

/// Emitted after a slice snapshot reached durable storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPersisted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub storage_key: String,
    pub bytes: usize,
}

impl SnapshotPersisted {
    pub fn new(storage_key: String, bytes: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            storage_key,
            bytes,
        }
    }
}

impl_domain_event!(SnapshotPersisted);

/// Emitted when a snapshot could not be serialized or written.
/// The failure is never propagated to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPersistFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub storage_key: String,
    pub reason: String,
}

impl SnapshotPersistFailed {
    pub fn new(storage_key: String, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            storage_key,
            reason,
        }
    }
}

impl_domain_event!(SnapshotPersistFailed);

/// Emitted once the store has been seeded from storage and the persist gate opened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRehydrated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub restored: Vec<String>,
    pub missing: Vec<String>,
    pub discarded: Vec<String>,
}

impl StoreRehydrated {
    pub fn new(restored: Vec<String>, missing: Vec<String>, discarded: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            restored,
            missing,
            discarded,
        }
    }
}

impl_domain_event!(StoreRehydrated);

/// Emitted when all persisted snapshots were deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePurged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub removed: usize,
}

impl StorePurged {
    pub fn new(removed: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            removed,
        }
    }
}

impl_domain_event!(StorePurged);

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Emitted when the refresh endpoint handed out a new access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRefreshed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    /// Requests that were parked behind this refresh.
    pub waiters: usize,
}

impl AccessTokenRefreshed {
    pub fn new(waiters: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            waiters,
        }
    }
}

impl_domain_event!(AccessTokenRefreshed);

/// Emitted when the in-memory token was dropped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCleared {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
}

impl SessionCleared {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            reason: reason.into(),
        }
    }
}

impl_domain_event!(SessionCleared);

// ============================================================================
// AUTH EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSignedIn {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl UserSignedIn {
    pub fn new(user_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
        }
    }
}

impl_domain_event!(UserSignedIn);

/// Emitted when the backend asks for a one-time code before issuing a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallengeIssued {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl OtpChallengeIssued {
    pub fn new(user_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
        }
    }
}

impl_domain_event!(OtpChallengeIssued);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSignedOut {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl UserSignedOut {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for UserSignedOut {
    fn default() -> Self {
        Self::new()
    }
}

impl_domain_event!(UserSignedOut);
