// src/services/persist_gate.rs
//
// Readiness signal for persisted state.
//
// Closed until the store has finished rehydrating; views (and the
// application commands) wait on it before reading a slice, so they never
// render over state that is about to be replaced.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Clone)]
pub struct PersistGate {
    tx: Arc<watch::Sender<bool>>,
}

impl PersistGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspend until the gate opens. Returns immediately if it already is.
    pub async fn ready(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|open| *open).await;
    }

    pub(crate) fn open(&self) {
        if !self.tx.send_replace(true) {
            log::debug!("persist gate opened");
        }
    }
}

impl Default for PersistGate {
    fn default() -> Self {
        Self::new()
    }
}
