//! Storage backends for services and alerts
//!
//! This module provides a trait-based abstraction over the shared store that
//! the simulator writes and the dashboard collaborators read.
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with the Tokio engine task
//! - **Row-atomic**: each write touches exactly one row in one statement
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database file
//! - **In-Memory**: No persistence, for testing and demo runs
//!
//! ## Usage
//!
//! ```no_run
//! use command_center::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./commandcenter.db").await?;
//!     let services = backend.list_services().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::{AlertFilter, NewAlert, NewService, ServiceMetricsUpdate};

use crate::config::StorageConfig;

/// Open the backend described by `config`
pub async fn open(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::None => {
            info!("using in-memory storage (no persistence)");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => Ok(Arc::new(sqlite::SqliteBackend::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => Err(StorageError::ConnectionFailed(
            "sqlite support not compiled in (enable the storage-sqlite feature)".to_string(),
        )),
    }
}
