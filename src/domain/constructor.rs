// src/domain/constructor.rs
use serde::{Deserialize, Serialize};

/// A team entry ("constructor" in F1 terms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    #[serde(default)]
    pub constructor_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nationality: String,
}
