//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Dashboard reads proceed while the simulator writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Atomicity
//!
//! Every simulator write is a single `UPDATE` statement, so a reader sees
//! either all metric columns of a step or none of them.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlertFilter, NewAlert, NewService, ServiceMetricsUpdate};
use crate::{AlertId, AlertRecord, Service, ServiceId, ServiceStatus, Severity};

const SERVICE_COLUMNS: &str = r#"
    id, name, type, region, status, uptime_percent, cpu_usage, memory_usage,
    request_rate, error_rate, latency_p99, last_check, created_at
"#;

const ALERT_SELECT: &str = r#"
    SELECT a.id, a.service_id, s.name AS service_name, a.type, a.severity, a.message,
           a.acknowledged, a.acknowledged_by, a.acknowledged_at, a.created_at
    FROM alerts a
    LEFT JOIN services s ON a.service_id = s.id
"#;

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for concurrent reads (WAL mode)
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use command_center::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./commandcenter.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn service_from_row(row: &SqliteRow) -> StorageResult<Service> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<ServiceStatus>()
            .map_err(StorageError::SerializationError)?;

        Ok(Service {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            kind: row.try_get("type")?,
            region: row.try_get("region")?,
            status,
            uptime_percent: row.try_get("uptime_percent")?,
            cpu_usage: row.try_get("cpu_usage")?,
            memory_usage: row.try_get("memory_usage")?,
            request_rate: row.try_get("request_rate")?,
            error_rate: row.try_get("error_rate")?,
            latency_p99: row.try_get("latency_p99")?,
            last_check: Self::millis_to_timestamp(row.try_get("last_check")?),
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
        })
    }

    fn alert_from_row(row: &SqliteRow) -> StorageResult<AlertRecord> {
        let severity: String = row.try_get("severity")?;
        let severity = severity
            .parse::<Severity>()
            .map_err(StorageError::SerializationError)?;

        Ok(AlertRecord {
            id: row.try_get("id")?,
            service_id: row.try_get("service_id")?,
            service_name: row.try_get("service_name")?,
            kind: row.try_get("type")?,
            severity,
            message: row.try_get("message")?,
            acknowledged: row.try_get::<i64, _>("acknowledged")? != 0,
            acknowledged_by: row.try_get("acknowledged_by")?,
            acknowledged_at: row
                .try_get::<Option<i64>, _>("acknowledged_at")?
                .map(Self::millis_to_timestamp),
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
        })
    }

    async fn fetch_alert(&self, id: AlertId) -> StorageResult<AlertRecord> {
        let sql = format!("{ALERT_SELECT} WHERE a.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("alert {id}")))?;

        Self::alert_from_row(&row)
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self))]
    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(Self::service_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get_service(&self, id: ServiceId) -> StorageResult<Option<Service>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::service_from_row).transpose()
    }

    #[instrument(skip(self, service), fields(name = %service.name))]
    async fn insert_service(&self, service: NewService) -> StorageResult<Service> {
        let now = Self::timestamp_to_millis(&Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO services (
                name, type, region, status, uptime_percent, cpu_usage, memory_usage,
                request_rate, error_rate, latency_p99, last_check, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.name)
        .bind(&service.kind)
        .bind(&service.region)
        .bind(service.status.as_str())
        .bind(service.uptime_percent)
        .bind(service.cpu_usage)
        .bind(service.memory_usage)
        .bind(service.request_rate)
        .bind(service.error_rate)
        .bind(service.latency_p99)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("inserted service {id}");

        self.get_service(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("service {id}")))
    }

    #[instrument(skip(self, update))]
    async fn update_service_metrics(
        &self,
        id: ServiceId,
        update: ServiceMetricsUpdate,
    ) -> StorageResult<()> {
        let now = Self::timestamp_to_millis(&Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE services
            SET cpu_usage = ?, memory_usage = ?, request_rate = ?, status = ?, last_check = ?
            WHERE id = ?
            "#,
        )
        .bind(update.cpu_usage)
        .bind(update.memory_usage)
        .bind(update.request_rate)
        .bind(update.status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("service {id}")));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_service_status(&self, id: ServiceId, status: ServiceStatus) -> StorageResult<()> {
        let now = Self::timestamp_to_millis(&Utc::now());

        let result = sqlx::query("UPDATE services SET status = ?, last_check = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("service {id}")));
        }

        Ok(())
    }

    #[instrument(skip(self, alert), fields(service_id = ?alert.service_id))]
    async fn insert_alert(&self, alert: NewAlert) -> StorageResult<AlertRecord> {
        let now = Self::timestamp_to_millis(&Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO alerts (service_id, type, severity, message, acknowledged, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(alert.service_id)
        .bind(&alert.kind)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch_alert(result.last_insert_rowid()).await
    }

    #[instrument(skip(self))]
    async fn query_alerts(&self, filter: AlertFilter) -> StorageResult<Vec<AlertRecord>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ALERT_SELECT);
        builder.push(" WHERE 1=1");

        if let Some(severity) = filter.severity {
            builder.push(" AND a.severity = ").push_bind(severity.as_str());
        }
        if let Some(acknowledged) = filter.acknowledged {
            builder
                .push(" AND a.acknowledged = ")
                .push_bind(i64::from(acknowledged));
        }
        if let Some(service_id) = filter.service_id {
            builder.push(" AND a.service_id = ").push_bind(service_id);
        }

        builder.push(" ORDER BY a.created_at DESC, a.id DESC");

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        let alerts = rows
            .iter()
            .map(Self::alert_from_row)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("query returned {} alerts", alerts.len());
        Ok(alerts)
    }

    #[instrument(skip(self))]
    async fn acknowledge_alert(&self, id: AlertId, actor: &str) -> StorageResult<AlertRecord> {
        let now = Self::timestamp_to_millis(&Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET acknowledged = 1, acknowledged_by = ?, acknowledged_at = ?
            WHERE id = ?
            "#,
        )
        .bind(actor)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("alert {id}")));
        }

        self.fetch_alert(id).await
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (services,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;

        let (alerts, unacknowledged): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), SUM(CASE WHEN acknowledged = 0 THEN 1 ELSE 0 END) FROM alerts",
        )
        .fetch_one(&self.pool)
        .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        let file_size_mb = file_size as f64 / 1_000_000.0;

        Ok(format!(
            "SQLite: {} services, {} alerts ({} unacknowledged), {:.2} MB on disk",
            services,
            alerts,
            unacknowledged.unwrap_or(0),
            file_size_mb
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
