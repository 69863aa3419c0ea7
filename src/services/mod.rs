// src/services/mod.rs
//
// Services Module - Orchestration Layer
//
// The store and its slices, snapshot persistence, the auth state machine
// and the in-app notification queue.

pub mod auth_service;
pub mod fetch_status;
pub mod merge;
pub mod notification_center;
pub mod persist_gate;
pub mod persistor;
pub mod slice;
pub mod slices;
pub mod store;

#[cfg(test)]
mod store_tests;

// Re-export all services and their types
pub use auth_service::{AuthService, AuthState, USER_STORAGE_KEY};

pub use fetch_status::{FetchOutcome, FetchStatus};

pub use merge::MergeStrategy;

pub use notification_center::{NotificationCenter, NOTIFICATION_QUEUE_LIMIT};

pub use persist_gate::PersistGate;

pub use persistor::{storage_key, Persistor, SNAPSHOT_VERSION, STORAGE_KEY_PREFIX};

pub use slice::{PersistedSlice, Slice, SliceKind, SliceState};

pub use slices::{
    CircuitData,
    CircuitPayload,
    CircuitQuery,
    CircuitSlice,
    ConstructorData,
    ConstructorSlice,
    DriverData,
    DriverSlice,
    ResultData,
    ResultKey,
    ResultSlice,
    ScheduleData,
    ScheduleSlice,
};

pub use store::{RehydrationReport, Store};
