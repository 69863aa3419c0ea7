// src/services/auth_service.rs
//
// Auth Service - sign-in state machine
//
// Anonymous ──login──▶ Authenticated
//     │                    ▲
//     ├──login (2FA)──┐    │
//     └──signup───────┴▶ PendingOtp ──verify_otp──┘
//
// CRITICAL RULES:
// - The signed-in user record is persisted, the access token never is
// - restore_session() trusts a stored user only after a token refresh
// - logout always ends Anonymous, whatever the backend answers

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::User;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, OtpChallengeIssued, UserSignedIn, UserSignedOut};
use crate::integrations::{AuthGateway, LoginOutcome, OtpPurpose};
use crate::repositories::SnapshotRepository;

/// Storage key of the signed-in user record.
pub const USER_STORAGE_KEY: &str = "f1insight_user";

const USER_RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    /// A one-time code was sent to the user and must be verified.
    PendingOtp { user_id: String },
    Authenticated { user: User },
}

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    repository: Arc<dyn SnapshotRepository>,
    event_bus: Arc<EventBus>,
    state: RwLock<AuthState>,
}

impl AuthService {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        repository: Arc<dyn SnapshotRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            gateway,
            repository,
            event_bus,
            state: RwLock::new(AuthState::Anonymous),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user(&self) -> Option<User> {
        match self.state() {
            AuthState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), AuthState::Authenticated { .. })
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthState> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        match self.gateway.login(email.trim(), password).await? {
            LoginOutcome::Authenticated(user) => self.sign_in(user).await,
            LoginOutcome::OtpRequired { user_id } => Ok(self.await_otp(user_id)),
        }
    }

    /// Register an account. The backend sends a verification code.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> AppResult<AuthState> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AppError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        let user_id = self
            .gateway
            .signup(email.trim(), password, name.trim())
            .await?;
        Ok(self.await_otp(user_id))
    }

    /// Complete a pending login or signup.
    pub async fn verify_otp(&self, code: &str) -> AppResult<User> {
        let user_id = self.pending_user_id()?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("Verification code is required".to_string()));
        }

        let user = self.gateway.verify_otp(&user_id, code).await?;
        self.sign_in(user.clone()).await?;
        Ok(user)
    }

    pub async fn resend_otp(&self, purpose: OtpPurpose) -> AppResult<()> {
        let user_id = self.pending_user_id()?;
        self.gateway.resend_otp(&user_id, purpose).await
    }

    /// Pick up a session from a previous run.
    ///
    /// The stored user is only trusted if the refresh cookie still yields a
    /// token; otherwise the record is removed.
    pub async fn restore_session(&self) -> AuthState {
        let stored = match self.load_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return self.state(),
            Err(e) => {
                log::warn!("could not read stored user: {}", e);
                return self.state();
            }
        };

        match self.gateway.refresh().await {
            Ok(()) => {
                log::info!("restored session for {}", stored.id);
                self.event_bus.emit(UserSignedIn::new(stored.id.clone()));
                self.set_state(AuthState::Authenticated { user: stored })
            }
            Err(e) => {
                log::info!("stored session could not be refreshed: {}", e);
                if let Err(e) = self.forget_user().await {
                    log::warn!("could not remove stored user: {}", e);
                }
                self.set_state(AuthState::Anonymous)
            }
        }
    }

    /// Sign out locally and on the backend.
    pub async fn logout(&self) {
        if let Err(e) = self.gateway.logout().await {
            log::warn!("backend logout failed: {}", e);
        }
        if let Err(e) = self.forget_user().await {
            log::warn!("could not remove stored user: {}", e);
        }
        self.set_state(AuthState::Anonymous);
        self.event_bus.emit(UserSignedOut::new());
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    async fn sign_in(&self, user: User) -> AppResult<AuthState> {
        if let Err(e) = self.store_user(&user).await {
            // The session is still valid for this run.
            log::warn!("could not persist signed-in user: {}", e);
        }
        log::info!("user {} signed in", user.id);
        self.event_bus.emit(UserSignedIn::new(user.id.clone()));
        Ok(self.set_state(AuthState::Authenticated { user }))
    }

    fn await_otp(&self, user_id: String) -> AuthState {
        self.event_bus.emit(OtpChallengeIssued::new(user_id.clone()));
        self.set_state(AuthState::PendingOtp { user_id })
    }

    fn pending_user_id(&self) -> AppResult<String> {
        match self.state() {
            AuthState::PendingOtp { user_id } => Ok(user_id),
            _ => Err(AppError::Validation(
                "No verification is pending".to_string(),
            )),
        }
    }

    fn set_state(&self, next: AuthState) -> AuthState {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        next
    }

    async fn store_user(&self, user: &User) -> AppResult<()> {
        let payload = serde_json::to_string(user)?;
        let repo = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || {
            repo.save(USER_STORAGE_KEY, USER_RECORD_VERSION, &payload)
        })
        .await?
    }

    async fn load_user(&self) -> AppResult<Option<User>> {
        let repo = Arc::clone(&self.repository);
        let stored = tokio::task::spawn_blocking(move || repo.get(USER_STORAGE_KEY)).await??;

        match stored {
            Some(record) if record.version == USER_RECORD_VERSION => {
                Ok(serde_json::from_str(&record.payload).ok())
            }
            _ => Ok(None),
        }
    }

    async fn forget_user(&self) -> AppResult<()> {
        let repo = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || repo.delete(USER_STORAGE_KEY)).await?
    }
}
