// src/integrations/backend/envelope.rs
//
// Wire envelope shared by every backend endpoint:
// `{ success, data, pagination?, message? }`.

use serde::Deserialize;

use crate::domain::Pagination;

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    // No serde(default) here: it would require `T: Default`.
    pub data: Option<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            pagination: None,
            message: None,
        }
    }
}

impl<T: Default> ApiEnvelope<T> {
    /// `data` with a missing or null payload read as an empty one.
    pub fn into_data(self) -> T {
        self.data.unwrap_or_default()
    }
}

/// Body of `POST /auth/refresh`. The token normally sits under `data`;
/// a bare top-level `accessToken` is accepted too.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshBody {
    #[serde(default)]
    data: Option<TokenData>,
    #[serde(default, rename = "accessToken")]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenData {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl RefreshBody {
    pub(crate) fn into_token(self) -> Option<String> {
        self.data
            .map(|d| d.access_token)
            .or(self.access_token)
            .filter(|t| !t.is_empty())
    }
}
