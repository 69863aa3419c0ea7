// src/events/mod.rs
//
// Internal Event System - Public API
//
// The event bus is the observability hook of the data layer: slices, the
// persistor and the session report what happened here instead of returning
// it to callers that do not care.

pub mod bus;
pub mod types;

pub use types::DomainEvent;

pub use types::{
    // Session & auth
    AccessTokenRefreshed,
    OtpChallengeIssued,
    SessionCleared,
    // Slices
    SliceFetchFailed,
    SliceFetchStarted,
    SliceFetchSucceeded,
    // Persistence
    SnapshotPersistFailed,
    SnapshotPersisted,
    StaleResponseDiscarded,
    StorePurged,
    StoreRehydrated,
    UserSignedIn,
    UserSignedOut,
};

pub use bus::{EventBus, EventLogEntry};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
