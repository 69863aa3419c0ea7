// src/services/notification_center.rs
//
// Local toast queue. In memory only, newest first, never persisted.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Notification, NotificationKind};

/// Oldest entries past this are dropped, pinned or not.
pub const NOTIFICATION_QUEUE_LIMIT: usize = 10;

const NOTIFICATION_ID_LEN: usize = 7;

#[derive(Default)]
pub struct NotificationCenter {
    queue: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification at the front of the queue and return its id.
    pub fn push(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        auto_close: Option<u64>,
    ) -> String {
        let id = Uuid::new_v4().simple().to_string()[..NOTIFICATION_ID_LEN].to_string();
        let notification = Notification {
            id: id.clone(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now().timestamp_millis(),
            auto_close,
            pinned: false,
        };

        let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
        queue.insert(0, notification);
        queue.truncate(NOTIFICATION_QUEUE_LIMIT);
        id
    }

    /// Remove a notification. Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        self.queue
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| n.id != id);
    }

    /// Flip the pinned flag. Returns the new value, or None for unknown ids.
    pub fn toggle_pin(&self, id: &str) -> Option<bool> {
        let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
        let notification = queue.iter_mut().find(|n| n.id == id)?;
        notification.pinned = !notification.pinned;
        Some(notification.pinned)
    }

    /// Drop everything except pinned notifications.
    pub fn clear_all(&self) {
        self.queue
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| n.pinned);
    }

    pub fn list(&self) -> Vec<Notification> {
        self.queue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.queue.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
