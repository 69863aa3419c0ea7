// src/integrations/backend/session.rs
//
// Session context: the in-memory bearer token and the single-flight guard
// around token refresh.
//
// One SessionContext is shared by every ApiClient clone talking to the same
// backend. Several sessions can coexist in one process (tests do this).
//
// Refresh protocol:
// - the first caller that needs a new token becomes the leader and runs the
//   refresh future;
// - callers arriving while a refresh is in flight park a oneshot sender in
//   the waiter queue and await the leader's outcome;
// - the leader stores the new token (or clears it) and then resolves every
//   waiter with the same outcome.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::oneshot;

use crate::error::{AppError, AppResult};
use crate::events::{AccessTokenRefreshed, EventBus, SessionCleared};

type RefreshOutcome = Result<String, String>;

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

pub struct SessionContext {
    token: RwLock<Option<String>>,
    refresh: Mutex<RefreshState>,
    event_bus: Arc<EventBus>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
    Current(String),
}

impl SessionContext {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            token: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            event_bus,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Drop the token. Emits `SessionCleared` only if one was held.
    pub fn clear(&self, reason: &str) {
        let previous = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            log::info!("session cleared: {}", reason);
            self.event_bus.emit(SessionCleared::new(reason));
        }
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock_refresh().in_progress
    }

    /// Obtain a usable token after a request sent with `rejected` got a 401.
    ///
    /// If a refresh completed after that request went out, the newer token is
    /// returned without refreshing again. Otherwise joins (or leads) the
    /// single in-flight refresh.
    pub async fn renew<F, Fut>(&self, rejected: Option<&str>, refresh: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        self.single_flight(Some(rejected), refresh).await
    }

    /// Refresh unconditionally (session restore at startup), still through
    /// the single-flight guard.
    pub async fn force_refresh<F, Fut>(&self, refresh: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        self.single_flight(None, refresh).await
    }

    async fn single_flight<F, Fut>(
        &self,
        rejected: Option<Option<&str>>,
        refresh: F,
    ) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        let role = {
            let mut state = self.lock_refresh();
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Role::Follower(rx)
            } else {
                match (rejected, self.access_token()) {
                    (Some(sent), Some(current)) if sent != Some(current.as_str()) => {
                        Role::Current(current)
                    }
                    _ => {
                        state.in_progress = true;
                        Role::Leader
                    }
                }
            }
        };

        match role {
            Role::Current(token) => {
                log::debug!("token already renewed by a concurrent refresh, reusing it");
                Ok(token)
            }
            Role::Follower(rx) => {
                log::debug!("refresh already in flight, waiting for its outcome");
                match rx.await {
                    Ok(Ok(token)) => Ok(token),
                    Ok(Err(message)) => Err(AppError::Unauthorized(message)),
                    Err(_) => Err(AppError::Unauthorized(
                        "token refresh was abandoned".to_string(),
                    )),
                }
            }
            Role::Leader => {
                let mut guard = LeaderGuard {
                    session: self,
                    finished: false,
                };
                let outcome = refresh().await;
                guard.finished = true;
                self.finish_refresh(outcome)
            }
        }
    }

    fn finish_refresh(&self, outcome: AppResult<String>) -> AppResult<String> {
        match outcome {
            Ok(token) => {
                // Token first: anyone who sees `in_progress == false` must
                // also see the new token.
                self.set_access_token(Some(token.clone()));
                let waiters = self.release();
                let count = waiters.len();
                for waiter in waiters {
                    let _ = waiter.send(Ok(token.clone()));
                }
                log::info!("access token refreshed ({} queued requests resumed)", count);
                self.event_bus.emit(AccessTokenRefreshed::new(count));
                Ok(token)
            }
            Err(err) => {
                let message = err.to_string();
                self.clear("token refresh failed");
                let waiters = self.release();
                log::warn!(
                    "token refresh failed, rejecting {} queued requests: {}",
                    waiters.len(),
                    message
                );
                for waiter in waiters {
                    let _ = waiter.send(Err(message.clone()));
                }
                Err(AppError::Unauthorized(message))
            }
        }
    }

    fn release(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        let mut state = self.lock_refresh();
        state.in_progress = false;
        std::mem::take(&mut state.waiters)
    }

    fn lock_refresh(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the in-progress flag if the leader's future is dropped before
/// the refresh resolves. Dropping the waiter senders fails the followers.
struct LeaderGuard<'a> {
    session: &'a SessionContext,
    finished: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let abandoned = self.session.release();
            log::warn!(
                "token refresh abandoned, {} queued requests rejected",
                abandoned.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn session() -> Arc<SessionContext> {
        Arc::new(SessionContext::new(Arc::new(EventBus::new())))
    }

    #[tokio::test]
    async fn test_concurrent_renewals_share_one_refresh() {
        let session = session();
        session.set_access_token(Some("stale".to_string()));
        let calls = Arc::new(AtomicUsize::new(0));

        let refresh = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, AppError>("fresh".to_string())
        };

        let (a, b, c) = tokio::join!(
            session.renew(Some("stale"), || refresh(calls.clone())),
            session.renew(Some("stale"), || refresh(calls.clone())),
            session.renew(Some("stale"), || refresh(calls.clone())),
        );

        assert_eq!(a.unwrap(), "fresh");
        assert_eq!(b.unwrap(), "fresh");
        assert_eq!(c.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.access_token().as_deref(), Some("fresh"));
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_everyone_and_clears_token() {
        let bus = Arc::new(EventBus::new());
        let session = SessionContext::new(bus.clone());
        session.set_access_token(Some("stale".to_string()));

        let refresh = || async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err::<String, _>(AppError::Api {
                status: 401,
                message: "refresh token expired".to_string(),
                details: None,
            })
        };

        let (a, b) = tokio::join!(
            session.renew(Some("stale"), refresh),
            session.renew(Some("stale"), refresh),
        );

        assert!(matches!(a, Err(AppError::Unauthorized(ref m)) if m.contains("refresh token expired")));
        assert!(matches!(b, Err(AppError::Unauthorized(_))));
        assert!(session.access_token().is_none());
        assert_eq!(bus.count_of("SessionCleared"), 1);
    }

    #[tokio::test]
    async fn test_rejection_with_outdated_token_reuses_current() {
        let session = session();
        session.set_access_token(Some("newer".to_string()));
        let calls = AtomicUsize::new(0);

        let token = session
            .renew(Some("older"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>("unexpected".to_string())
            })
            .await
            .unwrap();

        assert_eq!(token, "newer");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_current_token() {
        let session = session();
        session.set_access_token(Some("current".to_string()));

        let token = session
            .force_refresh(|| async { Ok::<_, AppError>("rotated".to_string()) })
            .await
            .unwrap();

        assert_eq!(token, "rotated");
        assert_eq!(session.access_token().as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_guard() {
        let session = session();

        let leader = session.force_refresh(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>("never".to_string())
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(20), leader).await;
        assert!(timed_out.is_err());

        assert!(!session.is_refreshing());

        let token = session
            .force_refresh(|| async { Ok::<_, AppError>("second".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "second");
    }
}
