// src/services/store_tests.rs
//
// Store tests: slices against a mocked gateway, snapshots on a temp-file
// SQLite database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::db::{create_connection_pool, initialize_database};
use crate::domain::{
    Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, Race, Season,
};
use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::integrations::backend::MockF1Gateway;
use crate::integrations::F1Gateway;
use crate::repositories::{SnapshotRepository, SqliteSnapshotRepository};

// ============================================================================
// FIXTURES
// ============================================================================

fn repository() -> (tempfile::TempDir, Arc<dyn SnapshotRepository>) {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_connection_pool(&dir.path().join("store.db")).unwrap();
    initialize_database(&pool.get().unwrap()).unwrap();
    (dir, Arc::new(SqliteSnapshotRepository::new(Arc::new(pool))))
}

fn store_with(
    gateway: impl F1Gateway + 'static,
    repository: Arc<dyn SnapshotRepository>,
) -> (Store, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let store = Store::new(Arc::new(gateway), repository, Arc::clone(&bus));
    (store, bus)
}

fn race(season: &str, round: &str, name: &str) -> Race {
    Race {
        season: season.to_string(),
        round: round.to_string(),
        race_name: name.to_string(),
        ..Default::default()
    }
}

fn driver(id: &str) -> Driver {
    Driver {
        driver_id: id.to_string(),
        ..Default::default()
    }
}

/// Answers driver and result requests after a per-year delay, so tests can
/// make an earlier request finish after a later one.
struct DelayedGateway;

impl DelayedGateway {
    async fn pause(year: &str) {
        let millis = if year == "2023" { 150 } else { 5 };
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl F1Gateway for DelayedGateway {
    async fn get_schedule(&self, _year: &str) -> AppResult<Vec<Race>> {
        Ok(vec![])
    }

    async fn get_drivers(&self, year: &str) -> AppResult<Vec<Driver>> {
        Self::pause(year).await;
        if year == "1949" {
            return Err(AppError::Api {
                status: 404,
                message: "No season 1949".to_string(),
                details: None,
            });
        }
        Ok(vec![driver(&format!("driver-{}", year))])
    }

    async fn get_constructors(&self, _year: &str) -> AppResult<Vec<Constructor>> {
        Ok(vec![])
    }

    async fn get_all_circuits(&self, _year: &str) -> AppResult<Vec<Circuit>> {
        Ok(vec![])
    }

    async fn get_circuit(&self, _circuit_id: &str) -> AppResult<Option<Circuit>> {
        Ok(None)
    }

    async fn get_race_results(&self, year: &str, round: &str) -> AppResult<Option<Race>> {
        Self::pause(year).await;
        Ok(Some(race(year, round, &format!("{} round {}", year, round))))
    }

    async fn get_driver_standings(&self, _year: &str) -> AppResult<Vec<DriverStanding>> {
        Ok(vec![])
    }

    async fn get_constructor_standings(&self, _year: &str) -> AppResult<Vec<ConstructorStanding>> {
        Ok(vec![])
    }

    async fn get_seasons(&self) -> AppResult<Vec<Season>> {
        Ok(vec![])
    }
}

// ============================================================================
// FETCH
// ============================================================================

#[tokio::test]
async fn test_schedule_example_scenario() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .withf(|year| year == "2025")
        .times(1)
        .returning(|_| {
            let races: Vec<Race> = serde_json::from_value(json!([{
                "season": "2025",
                "round": "1",
                "raceName": "Bahrain GP",
                "circuit": { "circuitId": "bahrain" },
                "date": "2025-03-02"
            }]))
            .unwrap();
            Ok(races)
        });

    let (store, _bus) = store_with(gateway, repo);
    let outcome = store.schedule().fetch("2025".to_string()).await;

    assert_eq!(outcome, FetchOutcome::Succeeded);
    let state = store.schedule().state();
    assert_eq!(state.data.races.len(), 1);
    assert_eq!(state.data.races[0].circuit.circuit_id, "bahrain");
    assert_eq!(state.status, FetchStatus::Succeeded);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_fetch_holds_exactly_what_the_gateway_returned() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway.expect_get_drivers().returning(|year| {
        let count: usize = match year {
            "2021" => 0,
            "2022" => 3,
            _ => 20,
        };
        Ok((0..count).map(|n| driver(&format!("{}-{}", year, n))).collect())
    });

    let (store, _bus) = store_with(gateway, repo);

    for (year, expected) in [("2021", 0), ("2022", 3), ("2025", 20)] {
        store.drivers().fetch(year.to_string()).await;
        assert_eq!(store.drivers().data().drivers.len(), expected);
        assert_eq!(store.drivers().status(), FetchStatus::Succeeded);
    }
}

#[tokio::test]
async fn test_failure_records_message_and_next_success_clears_it() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    let mut seq = mockall::Sequence::new();
    gateway
        .expect_get_constructors()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(AppError::Network("connection reset".to_string())));
    gateway
        .expect_get_constructors()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(vec![Constructor {
                constructor_id: "williams".to_string(),
                ..Default::default()
            }])
        });

    let (store, bus) = store_with(gateway, repo);

    let outcome = store.constructors().fetch("2025".to_string()).await;
    assert!(outcome.is_failure());
    assert_eq!(store.constructors().status(), FetchStatus::Failed);
    assert!(store
        .constructors()
        .error()
        .unwrap()
        .contains("connection reset"));
    assert_eq!(bus.count_of("SliceFetchFailed"), 1);

    store.constructors().fetch("2025".to_string()).await;
    assert_eq!(store.constructors().status(), FetchStatus::Succeeded);
    assert!(store.constructors().error().is_none());
}

#[tokio::test]
async fn test_missing_circuit_fails_as_not_found() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway.expect_get_circuit().returning(|_| Ok(None));

    let (store, _bus) = store_with(gateway, repo);
    let outcome = store
        .circuits()
        .fetch(CircuitQuery::Single("atlantis".to_string()))
        .await;

    assert_eq!(outcome, FetchOutcome::Failed("Circuit not found".to_string()));
    assert_eq!(store.circuits().error().as_deref(), Some("Circuit not found"));
    assert!(store.circuits().data().selected_circuit.is_none());
}

#[tokio::test]
async fn test_circuit_list_and_selection_are_independent() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway.expect_get_all_circuits().returning(|_| {
        Ok(vec![
            Circuit {
                circuit_id: "bahrain".to_string(),
                ..Default::default()
            },
            Circuit {
                circuit_id: "jeddah".to_string(),
                ..Default::default()
            },
        ])
    });
    gateway.expect_get_circuit().returning(|id| {
        Ok(Some(Circuit {
            circuit_id: id.to_string(),
            ..Default::default()
        }))
    });

    let (store, _bus) = store_with(gateway, repo);
    store
        .circuits()
        .fetch(CircuitQuery::Season("2025".to_string()))
        .await;
    store
        .circuits()
        .fetch(CircuitQuery::Single("monza".to_string()))
        .await;

    let data = store.circuits().data();
    assert_eq!(data.circuits.len(), 2);
    assert_eq!(data.selected_circuit.unwrap().circuit_id, "monza");
}

#[tokio::test]
async fn test_results_accumulate_across_rounds() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_race_results()
        .returning(|year, round| Ok(Some(race(year, round, "GP"))));

    let (store, _bus) = store_with(gateway, repo);
    store.results().fetch(ResultKey::new("2024", "5")).await;
    store.results().fetch(ResultKey::new("2023", "12")).await;

    let data = store.results().data();
    assert_eq!(data.get("2024", "5").unwrap().round, "5");
    assert_eq!(data.get("2023", "12").unwrap().season, "2023");
    assert!(data.get("2024", "12").is_none());
}

#[tokio::test]
async fn test_missing_results_fail_as_not_found() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway.expect_get_race_results().returning(|_, _| Ok(None));

    let (store, _bus) = store_with(gateway, repo);
    let outcome = store.results().fetch(ResultKey::new("2030", "1")).await;

    assert_eq!(
        outcome,
        FetchOutcome::Failed("No results for 2030 round 1".to_string())
    );
}

// ============================================================================
// STALE RESPONSES
// ============================================================================

#[tokio::test]
async fn test_stale_response_is_discarded_by_replace_slice() {
    let (_dir, repo) = repository();
    let (store, bus) = store_with(DelayedGateway, repo);
    let drivers = store.drivers();

    let (slow, fast) = tokio::join!(drivers.fetch("2023".to_string()), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drivers.fetch("2024".to_string()).await
    });

    assert_eq!(slow, FetchOutcome::Superseded);
    assert_eq!(fast, FetchOutcome::Succeeded);
    assert_eq!(drivers.data().drivers, vec![driver("driver-2024")]);
    assert_eq!(drivers.status(), FetchStatus::Succeeded);
    assert_eq!(bus.count_of("StaleResponseDiscarded"), 1);
}

#[tokio::test]
async fn test_stale_failure_does_not_overwrite_success() {
    let (_dir, repo) = repository();
    let (store, _bus) = store_with(DelayedGateway, repo);
    let drivers = store.drivers();

    let (first, second) = tokio::join!(drivers.fetch("1949".to_string()), async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        drivers.fetch("2024".to_string()).await
    });

    // 1949 is fast too, so whichever finished first, the latest request wins.
    assert_ne!(second, FetchOutcome::Superseded);
    assert!(matches!(first, FetchOutcome::Superseded | FetchOutcome::Failed(_)));
    assert_eq!(drivers.status(), FetchStatus::Succeeded);
    assert!(drivers.error().is_none());
}

#[tokio::test]
async fn test_stale_result_is_still_merged() {
    let (_dir, repo) = repository();
    let (store, bus) = store_with(DelayedGateway, repo);
    let results = store.results();

    let (slow, fast) = tokio::join!(results.fetch(ResultKey::new("2023", "1")), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        results.fetch(ResultKey::new("2024", "1")).await
    });

    assert_eq!(slow, FetchOutcome::Superseded);
    assert_eq!(fast, FetchOutcome::Succeeded);

    let data = results.data();
    assert!(data.get("2023", "1").is_some());
    assert!(data.get("2024", "1").is_some());
    assert_eq!(results.status(), FetchStatus::Succeeded);
    assert_eq!(bus.count_of("StaleResponseDiscarded"), 1);
}

#[tokio::test]
async fn test_superseded_caller_can_wait_for_newer_outcome() {
    let (_dir, repo) = repository();
    let (store, _bus) = store_with(DelayedGateway, repo);
    let drivers = store.drivers();

    let (replaced, latest) = tokio::join!(
        async {
            let outcome = drivers.fetch("2024".to_string()).await;
            drivers.settled().await;
            outcome
        },
        async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            drivers.fetch("2023".to_string()).await
        }
    );

    assert_eq!(replaced, FetchOutcome::Superseded);
    assert_eq!(latest, FetchOutcome::Succeeded);
    assert!(drivers.holds(&"2023".to_string()));
    assert!(!drivers.holds(&"2024".to_string()));
    assert_eq!(drivers.data().drivers, vec![driver("driver-2023")]);
}

#[tokio::test]
async fn test_cancelled_newer_fetch_does_not_strand_waiters() {
    let (_dir, repo) = repository();
    let (store, _bus) = store_with(DelayedGateway, repo);
    let drivers = store.drivers();

    let waited = tokio::time::timeout(Duration::from_millis(500), async {
        tokio::join!(
            async {
                let outcome = drivers.fetch("2024".to_string()).await;
                drivers.settled().await;
                outcome
            },
            async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                // 2023 answers in 150 ms; give up long before that.
                let _ = tokio::time::timeout(
                    Duration::from_millis(20),
                    drivers.fetch("2023".to_string()),
                )
                .await;
            }
        )
    })
    .await;

    let (replaced, ()) = waited.unwrap();
    assert_eq!(replaced, FetchOutcome::Superseded);
    assert!(!drivers.holds(&"2024".to_string()));
    assert!(!drivers.holds(&"2023".to_string()));
}

#[tokio::test]
async fn test_settled_returns_at_once_when_nothing_is_pending() {
    let (_dir, repo) = repository();
    let (store, _bus) = store_with(DelayedGateway, repo);

    store.drivers().fetch("2024".to_string()).await;

    tokio::time::timeout(Duration::from_millis(50), store.drivers().settled())
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_millis(50), store.results().settled())
        .await
        .unwrap();
}

// ============================================================================
// ENSURE / RESET
// ============================================================================

#[tokio::test]
async fn test_ensure_skips_cached_keys() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .times(2)
        .returning(|year| Ok(vec![race(year, "1", "Opening round")]));
    gateway
        .expect_get_race_results()
        .times(1)
        .returning(|year, round| Ok(Some(race(year, round, "GP"))));

    let (store, _bus) = store_with(gateway, repo);

    assert_eq!(store.schedule().ensure("2025".to_string()).await, FetchOutcome::Succeeded);
    assert_eq!(store.schedule().ensure("2025".to_string()).await, FetchOutcome::Skipped);
    assert_eq!(store.schedule().ensure("2024".to_string()).await, FetchOutcome::Succeeded);

    let key = ResultKey::new("2024", "3");
    assert_eq!(store.results().ensure(key.clone()).await, FetchOutcome::Succeeded);
    assert_eq!(store.results().ensure(key).await, FetchOutcome::Skipped);
}

#[tokio::test]
async fn test_reset_empties_slice() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .returning(|year| Ok(vec![race(year, "1", "Opening round")]));

    let (store, _bus) = store_with(gateway, Arc::clone(&repo));
    store.rehydrate().await;
    store.schedule().fetch("2025".to_string()).await;

    store.schedule().reset();
    store.flush().await;

    assert_eq!(store.schedule().state(), SliceState::default());
    let stored = repo.get("persist:schedule").unwrap().unwrap();
    assert_eq!(stored.payload, r#"{"races":[]}"#);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[tokio::test]
async fn test_snapshot_restores_into_fresh_store_as_idle() {
    let (_dir, repo) = repository();

    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .returning(|_| Ok(vec![race("2025", "1", "Bahrain GP"), race("2025", "2", "Saudi Arabian GP")]));
    gateway
        .expect_get_race_results()
        .returning(|year, round| Ok(Some(race(year, round, "GP"))));

    let (first, _bus) = store_with(gateway, Arc::clone(&repo));
    let report = first.rehydrate().await;
    assert_eq!(report.missing.len(), 5);

    first.schedule().fetch("2025".to_string()).await;
    first.results().fetch(ResultKey::new("2024", "5")).await;
    first.flush().await;

    let (second, bus) = store_with(MockF1Gateway::new(), Arc::clone(&repo));
    let report = second.rehydrate().await;

    assert_eq!(report.restored, vec!["schedule".to_string(), "result".to_string()]);
    assert_eq!(second.schedule().data(), first.schedule().data());
    assert_eq!(second.schedule().status(), FetchStatus::Idle);
    assert!(second.schedule().error().is_none());
    assert!(second.results().data().get("2024", "5").is_some());
    assert_eq!(bus.count_of("StoreRehydrated"), 1);
}

#[tokio::test]
async fn test_overlapping_result_fetches_persist_the_merged_map() {
    let (_dir, repo) = repository();
    let (first, _bus) = store_with(DelayedGateway, Arc::clone(&repo));
    first.rehydrate().await;
    let results = first.results();

    tokio::join!(
        results.fetch(ResultKey::new("2023", "1")),
        results.fetch(ResultKey::new("2024", "1")),
        results.fetch(ResultKey::new("2024", "2")),
    );
    first.flush().await;

    let (second, _bus) = store_with(MockF1Gateway::new(), Arc::clone(&repo));
    second.rehydrate().await;

    let restored = second.results().data();
    assert_eq!(restored, results.data());
    assert!(restored.get("2023", "1").is_some());
    assert!(restored.get("2024", "1").is_some());
    assert!(restored.get("2024", "2").is_some());
}

#[tokio::test]
async fn test_snapshot_contains_only_whitelisted_fields() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .returning(|_| Err(AppError::Network("offline".to_string())));
    gateway.expect_get_circuit().returning(|id| {
        Ok(Some(Circuit {
            circuit_id: id.to_string(),
            ..Default::default()
        }))
    });

    let (store, _bus) = store_with(gateway, Arc::clone(&repo));
    store.rehydrate().await;
    store.circuits().fetch(CircuitQuery::Single("suzuka".to_string())).await;
    store.schedule().reset();
    store.schedule().fetch("2025".to_string()).await;
    store.flush().await;

    for key in ["persist:circuit", "persist:schedule"] {
        let payload = repo.get(key).unwrap().unwrap().payload;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("status"), "{} leaked status", key);
        assert!(!object.contains_key("error"), "{} leaked error", key);
    }

    let circuit: serde_json::Value =
        serde_json::from_str(&repo.get("persist:circuit").unwrap().unwrap().payload).unwrap();
    assert_eq!(circuit["selectedCircuit"]["circuitId"], "suzuka");
}

#[tokio::test]
async fn test_unusable_snapshots_leave_slices_empty() {
    let (_dir, repo) = repository();
    repo.save("persist:schedule", 1, "{not json").unwrap();
    repo.save("persist:driver", 99, r#"{"drivers":[{"driverId":"hill"}]}"#)
        .unwrap();
    repo.save("persist:constructors", 1, r#"{"constructors":[{"constructorId":"brabham"}]}"#)
        .unwrap();

    let (store, _bus) = store_with(MockF1Gateway::new(), repo);
    let report = store.rehydrate().await;

    assert_eq!(report.restored, vec!["constructors".to_string()]);
    assert_eq!(
        report.discarded,
        vec!["schedule".to_string(), "driver".to_string()]
    );
    assert_eq!(report.missing, vec!["circuit".to_string(), "result".to_string()]);
    assert!(store.schedule().data().races.is_empty());
    assert!(store.drivers().data().drivers.is_empty());
    assert_eq!(store.constructors().data().constructors.len(), 1);
}

#[tokio::test]
async fn test_writes_before_rehydration_are_dropped() {
    let (_dir, repo) = repository();
    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_schedule()
        .returning(|_| Ok(vec![race("2025", "1", "Bahrain GP")]));

    let (store, _bus) = store_with(gateway, Arc::clone(&repo));
    assert!(!store.persist_gate().is_open());

    store.schedule().fetch("2025".to_string()).await;
    store.flush().await;
    assert!(repo.get("persist:schedule").unwrap().is_none());

    store.rehydrate().await;
    assert!(store.persist_gate().is_open());
    tokio::time::timeout(Duration::from_secs(1), store.persist_gate().ready())
        .await
        .expect("gate should be open after rehydration");

    store.schedule().fetch("2025".to_string()).await;
    store.flush().await;
    assert!(repo.get("persist:schedule").unwrap().is_some());
}

#[tokio::test]
async fn test_purge_removes_slice_snapshots_only() {
    let (_dir, repo) = repository();
    repo.save("f1insight_user", 1, r#"{"id":"u1","email":"a@b.c","name":"A"}"#)
        .unwrap();

    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_drivers()
        .returning(|_| Ok(vec![driver("albon")]));

    let (store, bus) = store_with(gateway, Arc::clone(&repo));
    store.rehydrate().await;
    store.drivers().fetch("2025".to_string()).await;

    let removed = store.purge().await.unwrap();

    assert_eq!(removed, 1);
    assert!(repo.get("persist:driver").unwrap().is_none());
    assert!(repo.get("f1insight_user").unwrap().is_some());
    assert_eq!(bus.count_of("StorePurged"), 1);
}

#[tokio::test]
async fn test_persist_failure_is_reported_not_propagated() {
    struct BrokenRepository;

    impl SnapshotRepository for BrokenRepository {
        fn save(&self, _key: &str, _version: u32, _payload: &str) -> AppResult<()> {
            Err(AppError::Other("disk full".to_string()))
        }
        fn get(&self, _key: &str) -> AppResult<Option<crate::repositories::StoredSnapshot>> {
            Ok(None)
        }
        fn delete(&self, _key: &str) -> AppResult<()> {
            Ok(())
        }
        fn list_keys(&self) -> AppResult<Vec<String>> {
            Ok(vec![])
        }
        fn delete_with_prefix(&self, _prefix: &str) -> AppResult<usize> {
            Ok(0)
        }
    }

    let mut gateway = MockF1Gateway::new();
    gateway
        .expect_get_drivers()
        .returning(|_| Ok(vec![driver("sargeant")]));

    let (store, bus) = store_with(gateway, Arc::new(BrokenRepository));
    store.rehydrate().await;

    let outcome = store.drivers().fetch("2023".to_string()).await;
    store.flush().await;

    assert_eq!(outcome, FetchOutcome::Succeeded);
    assert_eq!(store.drivers().data().drivers.len(), 1);
    assert_eq!(bus.count_of("SnapshotPersistFailed"), 1);
}
