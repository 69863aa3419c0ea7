// src/services/fetch_status.rs

use serde::{Deserialize, Serialize};

/// Lifecycle of a slice's most recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, FetchStatus::Succeeded | FetchStatus::Failed)
    }
}

/// What a call to `fetch`/`ensure` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The payload was applied and the slice is `Succeeded`.
    Succeeded,
    /// The slice is `Failed` with this message.
    Failed(String),
    /// A newer request for the same slice was issued while this one was in
    /// flight; its status was not touched.
    Superseded,
    /// `ensure` found the data already cached.
    Skipped,
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(FetchStatus::Succeeded).unwrap(), "succeeded");
        assert_eq!(FetchStatus::default(), FetchStatus::Idle);
    }

    #[test]
    fn test_settled_states() {
        assert!(!FetchStatus::Idle.is_settled());
        assert!(!FetchStatus::Loading.is_settled());
        assert!(FetchStatus::Succeeded.is_settled());
        assert!(FetchStatus::Failed.is_settled());
    }
}
