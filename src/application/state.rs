// src/application/state.rs

use std::sync::Arc;

use crate::events::EventBus;
use crate::integrations::{ApiClient, SessionContext};
use crate::services::{AuthService, NotificationCenter, Store};

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing across tasks.
/// Built by `app::bootstrap`.
#[derive(Clone)]
pub struct AppState {
    pub event_bus: Arc<EventBus>,
    pub session: Arc<SessionContext>,
    pub api: Arc<ApiClient>,
    pub store: Arc<Store>,
    pub auth: Arc<AuthService>,
    pub notifications: Arc<NotificationCenter>,
}
