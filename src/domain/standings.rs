// src/domain/standings.rs
use serde::{Deserialize, Serialize};

use super::{Constructor, Driver};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub position_text: String,
    #[serde(default)]
    pub points: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wins: String,
    #[serde(rename = "Driver", alias = "driver", default)]
    pub driver: Driver,
    #[serde(
        rename = "Constructors",
        alias = "constructors",
        default,
        deserialize_with = "crate::domain::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub constructors: Vec<Constructor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStanding {
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub position_text: String,
    #[serde(default)]
    pub points: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wins: String,
    #[serde(rename = "Constructor", alias = "constructor", default)]
    pub constructor: Constructor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub url: String,
}
