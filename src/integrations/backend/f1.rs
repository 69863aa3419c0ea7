// src/integrations/backend/f1.rs
//
// Season data endpoints under /f1/.
//
// Missing collections read as empty; only transport and HTTP failures are
// errors. Single-entity lookups answer None for "no such entity" so the
// caller decides how to surface it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::client::{ApiClient, ApiRequest};
use crate::domain::{
    Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, Race, Season,
};
use crate::error::{AppError, AppResult};

/// Read access to season data, as consumed by the cache slices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait F1Gateway: Send + Sync {
    async fn get_schedule(&self, year: &str) -> AppResult<Vec<Race>>;
    async fn get_drivers(&self, year: &str) -> AppResult<Vec<Driver>>;
    async fn get_constructors(&self, year: &str) -> AppResult<Vec<Constructor>>;
    async fn get_all_circuits(&self, year: &str) -> AppResult<Vec<Circuit>>;
    async fn get_circuit(&self, circuit_id: &str) -> AppResult<Option<Circuit>>;
    async fn get_race_results(&self, year: &str, round: &str) -> AppResult<Option<Race>>;
    async fn get_driver_standings(&self, year: &str) -> AppResult<Vec<DriverStanding>>;
    async fn get_constructor_standings(&self, year: &str) -> AppResult<Vec<ConstructorStanding>>;
    async fn get_seasons(&self) -> AppResult<Vec<Season>>;
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    races: Vec<Race>,
}

#[derive(Debug, Default, Deserialize)]
struct DriversData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    drivers: Vec<Driver>,
}

#[derive(Debug, Default, Deserialize)]
struct ConstructorsData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    constructors: Vec<Constructor>,
}

#[derive(Debug, Default, Deserialize)]
struct CircuitsData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    circuits: Vec<Circuit>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct StandingsData<T> {
    #[serde(default = "Vec::new", deserialize_with = "crate::domain::null_as_default")]
    standings: Vec<T>,
}

impl<T> Default for StandingsData<T> {
    fn default() -> Self {
        Self {
            standings: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SeasonsData {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    seasons: Vec<Season>,
}

/// Treat a 404 from a single-entity lookup as "not there".
fn absent_on_404<T>(result: AppResult<T>) -> AppResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Api { status: 404, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A payload counts as present only if it is a non-empty object.
fn non_empty_object(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    value.filter(|v| v.as_object().is_some_and(|map| !map.is_empty()))
}

#[async_trait]
impl F1Gateway for ApiClient {
    async fn get_schedule(&self, year: &str) -> AppResult<Vec<Race>> {
        let data: ScheduleData = self
            .fetch_data(&ApiRequest::get(format!("/f1/{}/schedule", year)))
            .await?;
        Ok(data.races)
    }

    async fn get_drivers(&self, year: &str) -> AppResult<Vec<Driver>> {
        let data: DriversData = self
            .fetch_data(&ApiRequest::get(format!("/f1/{}/drivers", year)))
            .await?;
        Ok(data.drivers)
    }

    async fn get_constructors(&self, year: &str) -> AppResult<Vec<Constructor>> {
        let data: ConstructorsData = self
            .fetch_data(&ApiRequest::get(format!("/f1/{}/constructors", year)))
            .await?;
        Ok(data.constructors)
    }

    async fn get_all_circuits(&self, year: &str) -> AppResult<Vec<Circuit>> {
        let data: CircuitsData = self
            .fetch_data(&ApiRequest::get(format!("/f1/{}/circuits", year)))
            .await?;
        Ok(data.circuits)
    }

    async fn get_circuit(&self, circuit_id: &str) -> AppResult<Option<Circuit>> {
        let request = ApiRequest::get(format!("/f1/circuits/{}", circuit_id));
        let data = absent_on_404(self.fetch_envelope::<serde_json::Value>(&request).await)?
            .and_then(|envelope| non_empty_object(envelope.data));

        let Some(mut data) = data else {
            return Ok(None);
        };

        // Either `{ circuit: {...} }` or the circuit itself.
        let payload = match data.get_mut("circuit") {
            Some(inner) => inner.take(),
            None => data,
        };

        match non_empty_object(Some(payload)) {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                AppError::Decode(format!("Failed to parse circuit {}: {}", circuit_id, e))
            }),
            None => Ok(None),
        }
    }

    async fn get_race_results(&self, year: &str, round: &str) -> AppResult<Option<Race>> {
        let request = ApiRequest::get(format!("/f1/{}/{}/results", year, round));
        let data = absent_on_404(self.fetch_envelope::<serde_json::Value>(&request).await)?
            .and_then(|envelope| non_empty_object(envelope.data));

        match data {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                AppError::Decode(format!(
                    "Failed to parse results for {} round {}: {}",
                    year, round, e
                ))
            }),
            None => Ok(None),
        }
    }

    async fn get_driver_standings(&self, year: &str) -> AppResult<Vec<DriverStanding>> {
        let data: StandingsData<DriverStanding> = self
            .fetch_data(&ApiRequest::get(format!("/f1/{}/standings/drivers", year)))
            .await?;
        Ok(data.standings)
    }

    async fn get_constructor_standings(&self, year: &str) -> AppResult<Vec<ConstructorStanding>> {
        let data: StandingsData<ConstructorStanding> = self
            .fetch_data(&ApiRequest::get(format!(
                "/f1/{}/standings/constructors",
                year
            )))
            .await?;
        Ok(data.standings)
    }

    async fn get_seasons(&self) -> AppResult<Vec<Season>> {
        let data: SeasonsData = self.fetch_data(&ApiRequest::get("/f1/seasons")).await?;
        Ok(data.seasons)
    }
}
