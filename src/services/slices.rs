// src/services/slices.rs
//
// The five cache slices: schedule, drivers, constructors, circuits, results.
//
// Each `*Data` struct is exactly the persisted whitelist of its slice and
// serializes with the keys the snapshot format uses (`races`,
// `selectedCircuit`, `resultsByRound`, ...).

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::fetch_status::FetchStatus;
use super::merge::MergeStrategy;
use super::slice::{SliceKind, SliceState};
use crate::domain::{Circuit, Constructor, Driver, Race};
use crate::error::{AppError, AppResult};
use crate::integrations::F1Gateway;

// ============================================================================
// SCHEDULE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleData {
    #[serde(default)]
    pub races: Vec<Race>,
}

pub struct ScheduleSlice;

#[async_trait]
impl SliceKind for ScheduleSlice {
    const NAME: &'static str = "schedule";
    const STRATEGY: MergeStrategy = MergeStrategy::Replace;

    type Key = String;
    type Payload = Vec<Race>;
    type Data = ScheduleData;

    async fn load(&self, gateway: &dyn F1Gateway, year: &String) -> AppResult<Vec<Race>> {
        gateway.get_schedule(year).await
    }

    fn merge(&self, data: &mut ScheduleData, _year: &String, races: Vec<Race>) {
        data.races = races;
    }

    fn fallback_error(&self, _year: &String) -> String {
        "Failed to fetch schedule".to_string()
    }
}

// ============================================================================
// DRIVERS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverData {
    #[serde(default)]
    pub drivers: Vec<Driver>,
}

pub struct DriverSlice;

#[async_trait]
impl SliceKind for DriverSlice {
    const NAME: &'static str = "driver";
    const STRATEGY: MergeStrategy = MergeStrategy::Replace;

    type Key = String;
    type Payload = Vec<Driver>;
    type Data = DriverData;

    async fn load(&self, gateway: &dyn F1Gateway, year: &String) -> AppResult<Vec<Driver>> {
        gateway.get_drivers(year).await
    }

    fn merge(&self, data: &mut DriverData, _year: &String, drivers: Vec<Driver>) {
        data.drivers = drivers;
    }

    fn fallback_error(&self, _year: &String) -> String {
        "Failed to fetch drivers".to_string()
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructorData {
    #[serde(default)]
    pub constructors: Vec<Constructor>,
}

pub struct ConstructorSlice;

#[async_trait]
impl SliceKind for ConstructorSlice {
    const NAME: &'static str = "constructors";
    const STRATEGY: MergeStrategy = MergeStrategy::Replace;

    type Key = String;
    type Payload = Vec<Constructor>;
    type Data = ConstructorData;

    async fn load(&self, gateway: &dyn F1Gateway, year: &String) -> AppResult<Vec<Constructor>> {
        gateway.get_constructors(year).await
    }

    fn merge(&self, data: &mut ConstructorData, _year: &String, constructors: Vec<Constructor>) {
        data.constructors = constructors;
    }

    fn fallback_error(&self, _year: &String) -> String {
        "Failed to fetch constructors".to_string()
    }
}

// ============================================================================
// CIRCUITS
// ============================================================================

/// The circuit slice serves two requests: a season's circuit list and a
/// single circuit's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitQuery {
    Season(String),
    Single(String),
}

impl fmt::Display for CircuitQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitQuery::Season(year) => write!(f, "season {}", year),
            CircuitQuery::Single(id) => write!(f, "circuit {}", id),
        }
    }
}

pub enum CircuitPayload {
    Season(Vec<Circuit>),
    Single(Circuit),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitData {
    #[serde(default)]
    pub circuits: Vec<Circuit>,
    #[serde(default)]
    pub selected_circuit: Option<Circuit>,
}

pub struct CircuitSlice;

#[async_trait]
impl SliceKind for CircuitSlice {
    const NAME: &'static str = "circuit";
    const STRATEGY: MergeStrategy = MergeStrategy::Replace;

    type Key = CircuitQuery;
    type Payload = CircuitPayload;
    type Data = CircuitData;

    async fn load(&self, gateway: &dyn F1Gateway, query: &CircuitQuery) -> AppResult<CircuitPayload> {
        match query {
            CircuitQuery::Season(year) => gateway
                .get_all_circuits(year)
                .await
                .map(CircuitPayload::Season),
            CircuitQuery::Single(id) => gateway
                .get_circuit(id)
                .await?
                .map(CircuitPayload::Single)
                .ok_or_else(|| AppError::NotFound("Circuit not found".to_string())),
        }
    }

    fn merge(&self, data: &mut CircuitData, _query: &CircuitQuery, payload: CircuitPayload) {
        match payload {
            CircuitPayload::Season(circuits) => data.circuits = circuits,
            CircuitPayload::Single(circuit) => data.selected_circuit = Some(circuit),
        }
    }

    fn fallback_error(&self, query: &CircuitQuery) -> String {
        match query {
            CircuitQuery::Season(_) => "Failed to fetch circuits".to_string(),
            CircuitQuery::Single(_) => "Failed to fetch circuit".to_string(),
        }
    }

    fn is_cached(&self, state: &SliceState<CircuitData, CircuitQuery>, query: &CircuitQuery) -> bool {
        match query {
            CircuitQuery::Single(id) => state
                .data
                .selected_circuit
                .as_ref()
                .is_some_and(|c| &c.circuit_id == id),
            CircuitQuery::Season(_) => {
                state.status == FetchStatus::Succeeded && state.last_key.as_ref() == Some(query)
            }
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultKey {
    pub year: String,
    pub round: String,
}

impl ResultKey {
    pub fn new(year: impl Into<String>, round: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            round: round.into(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {}", self.year, self.round)
    }
}

/// year → round → race with its classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultData {
    #[serde(default)]
    pub results_by_round: BTreeMap<String, BTreeMap<String, Race>>,
}

impl ResultData {
    pub fn get(&self, year: &str, round: &str) -> Option<&Race> {
        self.results_by_round.get(year)?.get(round)
    }

    pub fn contains(&self, key: &ResultKey) -> bool {
        self.get(&key.year, &key.round).is_some()
    }
}

pub struct ResultSlice;

#[async_trait]
impl SliceKind for ResultSlice {
    const NAME: &'static str = "result";
    const STRATEGY: MergeStrategy = MergeStrategy::UpsertByCompoundKey;

    type Key = ResultKey;
    type Payload = Race;
    type Data = ResultData;

    async fn load(&self, gateway: &dyn F1Gateway, key: &ResultKey) -> AppResult<Race> {
        gateway
            .get_race_results(&key.year, &key.round)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No results for {} round {}",
                    key.year, key.round
                ))
            })
    }

    fn merge(&self, data: &mut ResultData, key: &ResultKey, race: Race) {
        data.results_by_round
            .entry(key.year.clone())
            .or_default()
            .insert(key.round.clone(), race);
    }

    fn fallback_error(&self, _key: &ResultKey) -> String {
        "Failed to fetch results".to_string()
    }

    fn is_cached(&self, state: &SliceState<ResultData, ResultKey>, key: &ResultKey) -> bool {
        state.data.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_data_serializes_nested_map() {
        let mut data = ResultData::default();
        let slice = ResultSlice;
        slice.merge(
            &mut data,
            &ResultKey::new("2024", "5"),
            Race {
                race_name: "Chinese Grand Prix".into(),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value["resultsByRound"]["2024"]["5"]["raceName"],
            json!("Chinese Grand Prix")
        );
        assert!(data.contains(&ResultKey::new("2024", "5")));
        assert!(!data.contains(&ResultKey::new("2024", "6")));
    }

    #[test]
    fn test_circuit_data_snapshot_keys() {
        let data = CircuitData {
            circuits: vec![],
            selected_circuit: Some(Circuit {
                circuit_id: "monza".into(),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&data).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["circuits", "selectedCircuit"]);
    }

    #[test]
    fn test_circuit_single_lookup_cached_by_id() {
        let slice = CircuitSlice;
        let mut state: SliceState<CircuitData, CircuitQuery> = SliceState::default();
        state.data.selected_circuit = Some(Circuit {
            circuit_id: "spa".into(),
            ..Default::default()
        });

        assert!(slice.is_cached(&state, &CircuitQuery::Single("spa".into())));
        assert!(!slice.is_cached(&state, &CircuitQuery::Single("monza".into())));
        assert!(!slice.is_cached(&state, &CircuitQuery::Season("2025".into())));
    }
}
