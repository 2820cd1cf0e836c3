//! Failure tests for the simulation engine
//!
//! These tests verify that the engine handles failures gracefully:
//! - Store failures abandon the tick but keep the schedule alive
//! - Services deleted mid-tick are skipped
//! - Overlapping ticks are skipped, not queued
//! - Slow ticks are cut off by the timeout
//! - Invalid configuration is rejected before anything runs

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use command_center::{
    config::SimulationConfig,
    simulation::{FixedSequence, SimulationEngine, SimulationError},
    storage::{AlertFilter, MemoryBackend, StorageBackend},
};

use crate::helpers::*;

#[tokio::test]
async fn test_store_failure_is_swallowed_and_schedule_continues() {
    let store = Arc::new(FaultyStore::new(seeded_memory_store().await));
    store.set_fail_reads(true);

    let handle = SimulationEngine::new(fast_config(20), store.clone())
        .unwrap()
        .start();

    tokio::time::sleep(Duration::from_millis(150)).await;

    let stats = handle.get_stats().await.unwrap();
    assert!(stats.ticks_failed >= 2, "{stats:?}");
    assert_eq!(stats.ticks_completed, 0);
    assert!(stats.last_error.unwrap().contains("injected read failure"));
    assert!(handle.is_running());

    // Store recovers; the next ticks succeed
    store.set_fail_reads(false);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let stats = handle.get_stats().await.unwrap();
    assert!(stats.ticks_completed >= 1, "{stats:?}");
    assert!(store.list_calls() >= 4);

    handle.stop().await;
}

#[tokio::test]
async fn test_tick_now_reports_store_failure() {
    let store = Arc::new(FaultyStore::new(seeded_memory_store().await));
    store.set_fail_reads(true);

    let handle = SimulationEngine::new(test_config(0.2, 1), store.clone())
        .unwrap()
        .start();

    assert_matches!(handle.tick_now().await, Err(SimulationError::Storage(_)));

    store.set_fail_reads(false);
    assert!(handle.tick_now().await.is_ok());

    handle.stop().await;
}

#[tokio::test]
async fn test_deleted_service_is_skipped() {
    let inner = seeded_memory_store().await;
    let services = inner.list_services().await.unwrap();
    let doomed = services[3].id;

    let store = Arc::new(FaultyStore::new(inner.clone()));
    store.vanish_after_listing(doomed);

    let engine = SimulationEngine::with_random_source(
        test_config(0.0, 1),
        store.clone(),
        Box::new(FixedSequence::constant(0.5)),
    )
    .unwrap();

    let report = engine.tick().await.unwrap();

    assert_eq!(report.skipped, vec![doomed]);
    assert_eq!(report.updated.len(), services.len() - 1);
    assert!(!report.updated.contains(&doomed));
    assert!(inner.get_service(doomed).await.unwrap().is_none());

    let next = engine.tick().await.unwrap();
    assert!(next.skipped.is_empty());
    assert_eq!(next.updated.len(), services.len() - 1);
}

#[tokio::test]
async fn test_alert_outlives_its_service() {
    let inner = seeded_memory_store().await;
    let engine = SimulationEngine::new(test_config(1.0, 3), inner.clone()).unwrap();

    let alert = engine.tick().await.unwrap().alert.unwrap();
    let service_id = alert.service_id.unwrap();
    inner.remove_service(service_id).await.unwrap();

    let alerts = inner
        .query_alerts(AlertFilter::for_service(service_id))
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, alert.id);
    assert!(alerts[0].service_name.is_none());
}

#[tokio::test]
async fn test_overlapping_tick_is_skipped() {
    let store = Arc::new(FaultyStore::new(seeded_memory_store().await));
    store.set_list_delay(Duration::from_millis(100));

    let engine = SimulationEngine::new(test_config(0.0, 1), store.clone()).unwrap();

    let (first, second) = tokio::join!(engine.tick(), engine.tick());

    assert!(first.is_ok());
    assert_matches!(second, Err(SimulationError::TickInProgress));
    assert_eq!(store.list_calls(), 1);

    let stats = engine.stats();
    assert_eq!(stats.ticks_completed, 1);
    assert_eq!(stats.ticks_skipped, 1);

    // The guard is released once the first tick finishes
    assert!(engine.tick().await.is_ok());
}

#[tokio::test]
async fn test_slow_tick_times_out_and_releases_guard() {
    let store = Arc::new(FaultyStore::new(seeded_memory_store().await));
    store.set_list_delay(Duration::from_millis(300));

    let config = SimulationConfig {
        tick_interval_ms: 1_000,
        tick_timeout_ms: Some(50),
        ..test_config(0.0, 1)
    };
    let engine = SimulationEngine::new(config, store.clone()).unwrap();

    assert_matches!(
        engine.tick().await,
        Err(SimulationError::TickTimedOut(limit)) if limit == Duration::from_millis(50)
    );
    assert_eq!(engine.stats().ticks_failed, 1);

    store.set_list_delay(Duration::ZERO);
    assert!(engine.tick().await.is_ok());
}

#[tokio::test]
async fn test_invalid_configs_are_rejected() {
    let invalid = [
        SimulationConfig {
            tick_interval_ms: 0,
            ..test_config(0.2, 1)
        },
        test_config(-0.1, 1),
        test_config(1.01, 1),
        test_config(f64::NAN, 1),
        SimulationConfig {
            tick_timeout_ms: Some(3_600_000),
            ..test_config(0.2, 1)
        },
    ];

    for config in invalid {
        let store = Arc::new(MemoryBackend::new());
        assert_matches!(
            SimulationEngine::new(config.clone(), store),
            Err(SimulationError::InvalidConfig(_)),
            "{config:?}"
        );
    }
}

#[tokio::test]
async fn test_stopped_engine_rejects_commands() {
    let store = seeded_memory_store().await;
    let handle = SimulationEngine::new(test_config(0.2, 1), store)
        .unwrap()
        .start();
    let clone = handle.clone();

    handle.stop().await;

    assert!(!clone.is_running());
    assert_matches!(clone.tick_now().await, Err(SimulationError::EngineStopped));
}
