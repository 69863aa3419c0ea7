// src/integrations/backend/account.rs
//
// Signed-in user's profile and settings (/users/me).

use serde::Deserialize;
use serde_json::json;

use super::client::{ApiClient, ApiRequest};
use crate::domain::{PreferencesUpdate, ProfileUpdate, UserPreferences, UserProfile};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PreferencesData {
    Wrapped { preferences: UserPreferences },
    Bare(UserPreferences),
}

impl ApiClient {
    pub async fn get_profile(&self) -> AppResult<UserProfile> {
        self.fetch_required(&ApiRequest::get("/users/me")).await
    }

    /// Only the fields set in `update` are sent.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AppResult<UserProfile> {
        let request = ApiRequest::patch("/users/me").json(update)?;
        self.fetch_required(&request).await
    }

    pub async fn update_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> AppResult<UserPreferences> {
        let request = ApiRequest::patch("/users/me/preferences").json(update)?;
        let data: PreferencesData = self.fetch_required(&request).await?;
        Ok(match data {
            PreferencesData::Wrapped { preferences } => preferences,
            PreferencesData::Bare(preferences) => preferences,
        })
    }

    pub async fn change_password(&self, current: &str, new: &str) -> AppResult<()> {
        if new.is_empty() {
            return Err(AppError::Validation("New password must not be empty".to_string()));
        }
        let request = ApiRequest::patch("/users/me/password")
            .json(&json!({ "currentPassword": current, "newPassword": new }))?;
        self.send(&request).await
    }
}
