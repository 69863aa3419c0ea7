// src/integrations/backend/notifications.rs
//
// Server-side notification inbox. Unrelated to the local toast queue in
// services::notification_center.

use serde::Deserialize;

use super::client::{ApiClient, ApiRequest};
use crate::domain::{NotificationsPage, RemoteNotification};
use crate::error::AppResult;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboxData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    notifications: Vec<RemoteNotification>,
    #[serde(default)]
    unread_count: u32,
}

impl ApiClient {
    pub async fn list_notifications(
        &self,
        page: u32,
        limit: u32,
        unread_only: bool,
    ) -> AppResult<NotificationsPage> {
        let request = ApiRequest::get("/notifications")
            .query("page", page)
            .query("limit", limit)
            .query("unreadOnly", unread_only);

        let envelope = self.fetch_envelope::<InboxData>(&request).await?;
        let pagination = envelope.pagination.clone().unwrap_or_default();
        let data = envelope.into_data();
        Ok(NotificationsPage {
            notifications: data.notifications,
            unread_count: data.unread_count,
            pagination,
        })
    }

    pub async fn mark_notification_read(&self, id: &str) -> AppResult<()> {
        self.send(&ApiRequest::patch(format!("/notifications/{}/read", id)))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> AppResult<()> {
        self.send(&ApiRequest::post("/notifications/read-all")).await
    }

    pub async fn delete_notification(&self, id: &str) -> AppResult<()> {
        self.send(&ApiRequest::delete(format!("/notifications/{}", id)))
            .await
    }
}
