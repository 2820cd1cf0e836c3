//! Persistence of simulator output in the SQLite store

use std::sync::Arc;

use command_center::{
    Severity,
    config::StorageConfig,
    seed::seed_if_empty,
    simulation::SimulationEngine,
    storage::{self, AlertFilter, StorageBackend, sqlite::SqliteBackend},
};
use tempfile::tempdir;

use crate::helpers::{status_within_rounding, test_config};

#[tokio::test]
async fn test_ticks_persist_across_reopen() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("commandcenter.db");

    let (services, alert_count) = {
        let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        assert_eq!(seed_if_empty(store.as_ref()).await.unwrap(), 12);

        let engine = SimulationEngine::new(test_config(0.5, 21), store.clone()).unwrap();
        for _ in 0..20 {
            engine.tick().await.unwrap();
        }

        let services = store.list_services().await.unwrap();
        let alerts = store.query_alerts(AlertFilter::default()).await.unwrap();
        store.close().await.unwrap();
        (services, alerts.len())
    };

    let reopened = SqliteBackend::new(&db_path).await.unwrap();

    // Reopening must not reseed
    assert_eq!(seed_if_empty(&reopened).await.unwrap(), 0);
    assert_eq!(reopened.list_services().await.unwrap(), services);
    assert_eq!(
        reopened
            .query_alerts(AlertFilter::default())
            .await
            .unwrap()
            .len(),
        alert_count
    );

    for service in &services {
        assert!(status_within_rounding(service), "{}", service.name);
    }
}

#[tokio::test]
async fn test_emitted_alerts_carry_service_names() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(
        SqliteBackend::new(temp_dir.path().join("alerts.db"))
            .await
            .unwrap(),
    );
    seed_if_empty(store.as_ref()).await.unwrap();

    let engine = SimulationEngine::new(test_config(1.0, 8), store.clone()).unwrap();
    for _ in 0..5 {
        engine.tick().await.unwrap();
    }

    let alerts = store.query_alerts(AlertFilter::default()).await.unwrap();
    assert_eq!(alerts.len(), 5);

    for alert in &alerts {
        let name = alert.service_name.as_deref().unwrap();
        assert!(alert.message.starts_with(&format!("{name}: ")));
        assert!(matches!(alert.severity, Severity::Low | Severity::Medium));
    }

    // Newest first
    assert!(alerts.windows(2).all(|w| w[0].id > w[1].id));
}

#[tokio::test]
async fn test_acknowledgement_persists() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("ack.db");
    let config = StorageConfig::Sqlite {
        path: db_path.clone(),
    };

    let alert_id = {
        let store = storage::open(&config).await.unwrap();
        seed_if_empty(store.as_ref()).await.unwrap();

        let engine = SimulationEngine::new(test_config(1.0, 2), store.clone()).unwrap();
        let alert = engine.tick().await.unwrap().alert.unwrap();

        let acked = store.acknowledge_alert(alert.id, "night-shift").await.unwrap();
        assert!(acked.acknowledged);
        store.close().await.unwrap();
        alert.id
    };

    let store = storage::open(&config).await.unwrap();
    let open = store
        .query_alerts(AlertFilter::unacknowledged())
        .await
        .unwrap();
    assert!(open.iter().all(|a| a.id != alert_id));

    let all = store.query_alerts(AlertFilter::default()).await.unwrap();
    let acked = all.iter().find(|a| a.id == alert_id).unwrap();
    assert_eq!(acked.acknowledged_by.as_deref(), Some("night-shift"));
    assert!(acked.acknowledged_at.is_some());
}
