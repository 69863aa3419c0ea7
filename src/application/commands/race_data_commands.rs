// src/application/commands/race_data_commands.rs
//
// Race data commands
//
// RULES:
// - Wait for rehydration before touching a slice
// - Serve from cache when the slice already holds the key
// - Return slice data or an ErrorResponse, never an AppError

use crate::application::{error_handling::ErrorResponse, state::AppState};
use crate::domain::{Circuit, Race};
use crate::error::AppError;
use crate::services::{
    CircuitData, CircuitQuery, ConstructorData, DriverData, FetchOutcome, ResultKey,
    ScheduleData, Slice, SliceKind,
};

/// Race calendar for `year`.
pub async fn load_schedule(state: &AppState, year: &str) -> Result<ScheduleData, ErrorResponse> {
    let year = parse_year(year)?;
    state.store.persist_gate().ready().await;
    settle(state.store.schedule(), year).await
}

pub async fn load_drivers(state: &AppState, year: &str) -> Result<DriverData, ErrorResponse> {
    let year = parse_year(year)?;
    state.store.persist_gate().ready().await;
    settle(state.store.drivers(), year).await
}

pub async fn load_constructors(
    state: &AppState,
    year: &str,
) -> Result<ConstructorData, ErrorResponse> {
    let year = parse_year(year)?;
    state.store.persist_gate().ready().await;
    settle(state.store.constructors(), year).await
}

pub async fn load_circuits(state: &AppState, year: &str) -> Result<CircuitData, ErrorResponse> {
    let year = parse_year(year)?;
    state.store.persist_gate().ready().await;
    settle(state.store.circuits(), CircuitQuery::Season(year)).await
}

/// Details of one circuit.
pub async fn load_circuit(state: &AppState, circuit_id: &str) -> Result<Circuit, ErrorResponse> {
    let circuit_id = circuit_id.trim();
    if circuit_id.is_empty() {
        return Err(ErrorResponse::validation("Circuit id is required"));
    }
    state.store.persist_gate().ready().await;

    let data = settle(
        state.store.circuits(),
        CircuitQuery::Single(circuit_id.to_string()),
    )
    .await?;

    // A later lookup may have replaced the selection while this one was pending.
    data.selected_circuit
        .filter(|c| c.circuit_id == circuit_id)
        .ok_or_else(|| AppError::NotFound("Circuit not found".to_string()).into())
}

/// Classification of one race.
pub async fn load_race_results(
    state: &AppState,
    year: &str,
    round: &str,
) -> Result<Race, ErrorResponse> {
    let year = parse_year(year)?;
    let round = round.trim();
    if round.is_empty() || !round.chars().all(|c| c.is_ascii_digit()) {
        return Err(ErrorResponse::validation(format!("Invalid round: {}", round)));
    }
    state.store.persist_gate().ready().await;

    let data = settle(state.store.results(), ResultKey::new(year.as_str(), round)).await?;
    data.get(&year, round).cloned().ok_or_else(|| {
        AppError::NotFound(format!("No results for {} round {}", year, round)).into()
    })
}

async fn settle<S: SliceKind>(slice: &Slice<S>, key: S::Key) -> Result<S::Data, ErrorResponse> {
    match slice.ensure(key.clone()).await {
        FetchOutcome::Failed(message) => Err(ErrorResponse::fetch_failed(slice.name(), message)),
        FetchOutcome::Succeeded | FetchOutcome::Skipped => Ok(slice.data()),
        FetchOutcome::Superseded => {
            // A newer request owns the slice; answer from its outcome, and
            // only if that left this key's data in place.
            slice.settled().await;
            if slice.holds(&key) {
                Ok(slice.data())
            } else {
                Err(ErrorResponse::superseded(slice.name(), &key.to_string()))
            }
        }
    }
}

fn parse_year(year: &str) -> Result<String, ErrorResponse> {
    let year = year.trim();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        Ok(year.to_string())
    } else {
        Err(ErrorResponse::validation(format!("Invalid season: {}", year)))
    }
}
