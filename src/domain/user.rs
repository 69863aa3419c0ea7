// src/domain/user.rs
use serde::{Deserialize, Serialize};

/// The identity returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub favorite_driver: Option<String>,
    #[serde(default)]
    pub favorite_team: Option<String>,
    pub preferences: UserPreferences,
    pub stats: ProfileStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub race_alerts: bool,
    pub qualifying_alerts: bool,
    pub prediction_alerts: bool,
    pub driver_news_alerts: bool,
    pub two_factor_enabled: bool,
    /// Minutes of inactivity before the backend drops the session.
    pub session_timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_predictions: u32,
    pub avg_accuracy: Option<f64>,
    pub member_since: String,
    pub last_login: String,
}

/// Partial profile update; unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_team: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifying_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_news_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<u32>,
}
