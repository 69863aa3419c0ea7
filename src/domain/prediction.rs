// src/domain/prediction.rs
//
// Output of the remote prediction model. The model itself is opaque; these
// are only the shapes it answers with.

use serde::{Deserialize, Serialize};

use super::Pagination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPrediction {
    pub driver_id: String,
    #[serde(default)]
    pub constructor_id: String,
    pub predicted_finish_position: f64,
    pub podium_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RacePrediction {
    pub prediction_id: String,
    pub season: u32,
    pub round: u32,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub predictions: Vec<DriverPrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglePrediction {
    pub prediction_id: String,
    pub driver_id: String,
    pub predicted_finish_position: f64,
    pub podium_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Single,
    Race,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionHistoryItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub season: u32,
    pub round: u32,
    #[serde(rename = "type")]
    pub kind: PredictionKind,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub results: Vec<DriverPrediction>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionHistoryPage {
    pub predictions: Vec<PredictionHistoryItem>,
    pub pagination: Pagination,
}
