// src/app/bootstrap.rs
//
// Application wiring
//
// Order matters:
// 1. Database (pool + schema)
// 2. Repository
// 3. Event bus and session context
// 4. API client
// 5. Store (spawns the snapshot writer) and auth service
//
// Rehydration is left to the caller so it can decide when to await it.

use std::sync::Arc;

use crate::app::config::AppConfig;
use crate::application::AppState;
use crate::db::{
    create_connection_pool, get_connection, get_database_path, initialize_database,
    verify_database_integrity,
};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::{ApiClient, SessionContext};
use crate::repositories::{SnapshotRepository, SqliteSnapshotRepository};
use crate::services::{AuthService, NotificationCenter, Store};

/// Build the application state. Must be called from within a Tokio runtime.
pub fn bootstrap(config: &AppConfig) -> AppResult<AppState> {
    // 1. DATABASE
    let db_path = get_database_path(config.data_dir.as_deref())?;
    log::info!("using database at {}", db_path.display());
    let pool = Arc::new(create_connection_pool(&db_path)?);
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
        verify_database_integrity(&conn)?;
    }

    // 2. REPOSITORY
    let repository: Arc<dyn SnapshotRepository> = Arc::new(SqliteSnapshotRepository::new(pool));

    // 3. EVENTS & SESSION
    let event_bus = Arc::new(EventBus::new());
    let session = Arc::new(SessionContext::new(Arc::clone(&event_bus)));

    // 4. API CLIENT
    let api = Arc::new(ApiClient::new(
        &config.api_url,
        config.http_timeout,
        Arc::clone(&session),
    )?);
    log::info!("backend at {}", api.base_url());

    // 5. SERVICES
    let store = Arc::new(Store::new(
        api.clone(),
        Arc::clone(&repository),
        Arc::clone(&event_bus),
    ));
    let auth = Arc::new(AuthService::new(
        api.clone(),
        repository,
        Arc::clone(&event_bus),
    ));

    Ok(AppState {
        event_bus,
        session,
        api,
        store,
        auth,
        notifications: Arc::new(NotificationCenter::new()),
    })
}
