// src/domain/strategy.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyParams {
    pub predicted_position_mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_position_std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race_laps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestStrategy {
    pub label: String,
    pub expected_position: f64,
    pub std_position: f64,
}

/// Ranking rows come back snake_cased from the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRanking {
    pub label: String,
    pub expected_position: f64,
    pub std_position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundStrategy {
    pub name: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub compounds: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TacticalRecommendation {
    Text(String),
    Action {
        #[serde(rename = "type")]
        kind: String,
        action: String,
        confidence: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub strategy_id: String,
    pub best_strategy: BestStrategy,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub strategy_ranking: Vec<StrategyRanking>,
    #[serde(default)]
    pub safety_car_analysis: Option<serde_json::Value>,
    #[serde(default)]
    pub weather_impact: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub compound_strategies: Vec<CompoundStrategy>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub tactical_recommendations: Vec<TacticalRecommendation>,
}
