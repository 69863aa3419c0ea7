// src/domain/notification.rs
use serde::{Deserialize, Serialize};

use super::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Race,
    Prediction,
    Driver,
    System,
}

/// A toast held in the local notification queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    /// Auto-dismiss delay in milliseconds.
    pub auto_close: Option<u64>,
    pub pinned: bool,
}

/// A notification stored server-side for the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotification {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationsPage {
    pub notifications: Vec<RemoteNotification>,
    pub unread_count: u32,
    pub pagination: Pagination,
}
