//! Static JSON export of the dashboard data
//!
//! Writes `dashboard.json`, `services.json` and `alerts.json` into a
//! directory so the dashboard can be served without a running backend.
//! Each file has exactly the shape of the matching API response.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument};

use crate::api::types::{AlertsResponse, DashboardResponse, ServicesResponse};
use crate::storage::{AlertFilter, StorageBackend};

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let body = serde_json::to_vec(value).with_context(|| format!("failed to encode {name}"))?;
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Export the current store contents into `out_dir`, creating it if needed
///
/// Returns the paths written.
#[instrument(skip(store))]
pub async fn export_static(
    store: &dyn StorageBackend,
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let dashboard = DashboardResponse::load(store).await?;
    let services = ServicesResponse::load(store).await?;
    let alerts = AlertsResponse::load(store, AlertFilter::default()).await?;

    let written = vec![
        write_json(out_dir, "dashboard.json", &dashboard)?,
        write_json(out_dir, "services.json", &services)?,
        write_json(out_dir, "alerts.json", &alerts)?,
    ];

    info!(
        "exported {} services and {} alerts to {}",
        services.services.len(),
        alerts.alerts.len(),
        out_dir.display()
    );

    Ok(written)
}
