//! End-to-end tick behaviour against the in-memory store

use std::collections::HashSet;
use std::time::Duration;

use command_center::{
    simulation::{SimulationEngine, walk},
    storage::{AlertFilter, StorageBackend},
};

use crate::helpers::*;

#[tokio::test]
async fn test_certain_alert_references_existing_service() {
    let store = seeded_memory_store().await;
    let engine = SimulationEngine::new(test_config(1.0, 11), store.clone()).unwrap();

    let ids: HashSet<_> = store
        .list_services()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();

    for round in 1..=20 {
        let report = engine.tick().await.unwrap();
        let alert = report.alert.expect("p = 1 must emit every tick");

        assert!(ids.contains(&alert.service_id.unwrap()));
        assert!(alert.service_name.is_some());
        assert!(!alert.acknowledged);

        let stored = store.query_alerts(AlertFilter::default()).await.unwrap();
        assert_eq!(stored.len(), round);
    }
}

#[tokio::test]
async fn test_zero_probability_never_emits() {
    let store = seeded_memory_store().await;
    let engine = SimulationEngine::new(test_config(0.0, 11), store.clone()).unwrap();

    for _ in 0..100 {
        engine.tick().await.unwrap();
    }

    assert!(store
        .query_alerts(AlertFilter::default())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(engine.stats().ticks_completed, 100);
}

#[tokio::test]
async fn test_alert_frequency_tracks_probability() {
    // 100 draws at p = 0.2: mean 20, standard deviation 4
    for seed in [1, 2, 3, 42, 1337] {
        let store = seeded_memory_store().await;
        let engine = SimulationEngine::new(test_config(0.2, seed), store.clone()).unwrap();

        for _ in 0..100 {
            engine.tick().await.unwrap();
        }

        let emitted = store.query_alerts(AlertFilter::default()).await.unwrap().len();
        assert!(
            (6..=36).contains(&emitted),
            "seed {seed}: {emitted} alerts in 100 ticks"
        );
    }
}

#[tokio::test]
async fn test_metrics_stay_bounded_and_status_consistent() {
    let store = seeded_memory_store().await;
    let engine = SimulationEngine::new(test_config(0.2, 99), store.clone()).unwrap();

    for _ in 0..300 {
        engine.tick().await.unwrap();

        for service in store.list_services().await.unwrap() {
            assert!((walk::CPU_MIN..=walk::CPU_MAX).contains(&service.cpu_usage));
            assert!((walk::MEMORY_MIN..=walk::MEMORY_MAX).contains(&service.memory_usage));
            assert!(service.request_rate >= walk::REQUEST_RATE_MIN);
            assert!(
                status_within_rounding(&service),
                "{}: {} at cpu {} mem {}",
                service.name,
                service.status,
                service.cpu_usage,
                service.memory_usage
            );
        }
    }
}

#[tokio::test]
async fn test_untouched_columns_survive_ticks() {
    let store = seeded_memory_store().await;
    let before = store.list_services().await.unwrap();
    let engine = SimulationEngine::new(test_config(0.0, 5), store.clone()).unwrap();

    for _ in 0..10 {
        engine.tick().await.unwrap();
    }

    let after = store.list_services().await.unwrap();
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.name, new.name);
        assert_eq!(old.uptime_percent, new.uptime_percent);
        assert_eq!(old.error_rate, new.error_rate);
        assert_eq!(old.latency_p99, new.latency_p99);
        assert_eq!(old.created_at, new.created_at);
        assert!(new.last_check >= old.last_check);
    }
}

#[tokio::test]
async fn test_schedule_ticks_on_its_own() {
    let store = seeded_memory_store().await;
    let handle = SimulationEngine::new(fast_config(20), store.clone())
        .unwrap()
        .start();

    tokio::time::sleep(Duration::from_millis(250)).await;

    let stats = handle.get_stats().await.unwrap();
    assert!(
        stats.ticks_completed >= 3,
        "only {} ticks",
        stats.ticks_completed
    );
    assert_eq!(stats.ticks_failed, 0);
    assert_eq!(stats.services_updated, stats.ticks_completed * 12);

    handle.stop().await;
    let settled = store.list_services().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.list_services().await.unwrap(), settled);
}

#[tokio::test]
async fn test_first_scheduled_tick_waits_one_interval() {
    let store = seeded_memory_store().await;
    let handle = SimulationEngine::new(fast_config(500), store.clone())
        .unwrap()
        .start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.get_stats().await.unwrap().ticks_completed, 0);

    handle.stop().await;
}
