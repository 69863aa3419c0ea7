// src/main.rs
//
// Headless entry point: wires the data layer, restores persisted state and
// loads one season's calendar.
//
// Usage: f1insight [YEAR]

use anyhow::Context;
use chrono::Datelike;

use f1insight::application::commands::load_schedule;
use f1insight::services::AuthState;
use f1insight::{bootstrap, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. CONFIGURATION
    let config = AppConfig::from_env().context("invalid configuration")?;
    let year = std::env::args()
        .nth(1)
        .unwrap_or_else(|| chrono::Utc::now().year().to_string());

    // 2. WIRING
    let state = bootstrap(&config).context("failed to initialize")?;

    // 3. RESTORE
    let report = state.store.rehydrate().await;
    log::info!("restored slices: {:?}", report.restored);

    match state.auth.restore_session().await {
        AuthState::Authenticated { user } => log::info!("signed in as {}", user.email),
        _ => log::info!("not signed in"),
    }

    // 4. LOAD
    let result = load_schedule(&state, &year).await;
    state.store.flush().await;

    let schedule = match result {
        Ok(schedule) => schedule,
        Err(err) => {
            let body = serde_json::to_string_pretty(&err)?;
            anyhow::bail!("could not load the {} schedule:\n{}", year, body);
        }
    };

    println!("{} season: {} races", year, schedule.races.len());
    for race in &schedule.races {
        println!(
            "{:>3}  {:<10}  {:<30}  {}",
            race.round, race.date, race.race_name, race.circuit.circuit_name
        );
    }

    Ok(())
}
