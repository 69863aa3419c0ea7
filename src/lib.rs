// src/lib.rs
// F1 Insight - client data layer for the F1 dashboard
//
// Architecture:
// - Gateway: typed access to the backend API, one shared session context
// - Store: one cache slice per entity, stale responses discarded
// - Persistence: slice snapshots in SQLite, restored before first use
// - Event-driven: slices, persistor and session report through the event bus
// - Application Layer: commands views call, errors as ErrorResponse

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod app;
pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain Records
// ============================================================================

pub use domain::{
    Circuit,
    Constructor,
    ConstructorStanding,
    Driver,
    DriverStanding,
    Notification,
    NotificationKind,
    Pagination,
    Race,
    RaceResult,
    Season,
    User,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{create_event_bus, DomainEvent, EventBus, EventLogEntry};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{SnapshotRepository, SqliteSnapshotRepository, StoredSnapshot};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Auth
    AuthService,
    AuthState,
    // Store
    CircuitQuery,
    FetchOutcome,
    FetchStatus,
    MergeStrategy,
    // Notifications
    NotificationCenter,
    PersistGate,
    RehydrationReport,
    ResultKey,
    Slice,
    SliceState,
    Store,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use app::{bootstrap, AppConfig};
pub use application::{AppState, ErrorResponse, ErrorType};

// Re-export application submodules
pub use application::commands;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{ApiClient, AuthGateway, F1Gateway, LoginOutcome, OtpPurpose, SessionContext};
