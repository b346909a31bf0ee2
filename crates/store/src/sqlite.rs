//! SQLite store.
//!
//! Uses a single SQLite database file with four tables:
//! - `appointments` — bookings as the engine sees them
//! - `auxiliary_hours` — travel and cleaning records
//! - `service_durations` — observed durations per (subject, service kind)
//! - `service_standards` — standard duration per service kind
//!
//! Dates are stored as `YYYY-MM-DD` text so range filters compare lexically.

use async_trait::async_trait;
use chrono::NaiveDate;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_core::auxiliary::{AuxiliaryHourRecord, AuxiliaryKind};
use groomdesk_core::error::StoreError;
use groomdesk_core::service::{DurationSample, ServiceDurationHistory};
use groomdesk_core::store::{AppointmentSource, AuxiliaryHourStore, ServiceHistorySource};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// A SQLite-backed implementation of every storage trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to :memory: is a separate database.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id            TEXT PRIMARY KEY NOT NULL,
                date          TEXT NOT NULL,
                start_minute  INTEGER NOT NULL,
                end_minute    INTEGER NOT NULL,
                is_finalized  INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("appointments table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS auxiliary_hours (
                iid               INTEGER PRIMARY KEY AUTOINCREMENT,
                id                TEXT UNIQUE NOT NULL,
                date              TEXT NOT NULL,
                kind              TEXT NOT NULL,
                duration_minutes  INTEGER NOT NULL,
                is_finalized      INTEGER NOT NULL DEFAULT 0,
                description       TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("auxiliary_hours table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS service_durations (
                iid           INTEGER PRIMARY KEY AUTOINCREMENT,
                subject       TEXT NOT NULL,
                service_kind  TEXT NOT NULL,
                date          TEXT NOT NULL,
                minutes       INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("service_durations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS service_standards (
                service_kind  TEXT PRIMARY KEY NOT NULL,
                minutes       INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("service_standards table: {e}")))?;

        for (name, sql) in [
            (
                "appointments date index",
                "CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date)",
            ),
            (
                "auxiliary date index",
                "CREATE INDEX IF NOT EXISTS idx_auxiliary_hours_date ON auxiliary_hours(date)",
            ),
            (
                "service durations index",
                "CREATE INDEX IF NOT EXISTS idx_service_durations_lookup \
                 ON service_durations(subject, service_kind, date DESC)",
            ),
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{name}: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Insert or replace an appointment, assigning an id when it has none.
    pub async fn upsert_appointment(
        &self,
        mut appointment: AppointmentInterval,
    ) -> Result<String, StoreError> {
        if appointment.id.is_empty() {
            appointment.id = Uuid::new_v4().to_string();
        }
        sqlx::query(
            r#"
            INSERT INTO appointments (id, date, start_minute, end_minute, is_finalized)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                date = excluded.date,
                start_minute = excluded.start_minute,
                end_minute = excluded.end_minute,
                is_finalized = excluded.is_finalized
            "#,
        )
        .bind(&appointment.id)
        .bind(appointment.date.to_string())
        .bind(i64::from(appointment.start))
        .bind(i64::from(appointment.end))
        .bind(appointment.is_finalized)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT appointment failed: {e}")))?;

        debug!(id = %appointment.id, date = %appointment.date, "Stored appointment");
        Ok(appointment.id)
    }

    /// Delete an appointment (booking cancelled).
    pub async fn remove_appointment(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE appointment failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record an observed service duration.
    pub async fn record_service_duration(
        &self,
        subject: &str,
        service_kind: &str,
        sample: &DurationSample,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO service_durations (subject, service_kind, date, minutes) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(subject)
        .bind(service_kind)
        .bind(sample.date.to_string())
        .bind(sample.minutes)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT service duration failed: {e}")))?;
        Ok(())
    }

    pub async fn set_standard_duration(
        &self,
        service_kind: &str,
        minutes: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO service_standards (service_kind, minutes) VALUES (?1, ?2)
            ON CONFLICT(service_kind) DO UPDATE SET minutes = excluded.minutes
            "#,
        )
        .bind(service_kind)
        .bind(minutes)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("UPSERT standard duration failed: {e}")))?;
        Ok(())
    }

    /// Mark an auxiliary record finalized (done by the invoicing workflow).
    pub async fn finalize_auxiliary_hour(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE auxiliary_hours SET is_finalized = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("UPDATE finalize failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    fn parse_date(column: &str, text: &str) -> Result<NaiveDate, StoreError> {
        text.parse::<NaiveDate>()
            .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
    }

    fn minute_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<u32, StoreError> {
        let value: i64 = row
            .try_get(column)
            .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))?;
        u32::try_from(value)
            .map_err(|_| StoreError::QueryFailed(format!("{column} column out of range: {value}")))
    }

    fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<AppointmentInterval, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let date: String = row
            .try_get("date")
            .map_err(|e| StoreError::QueryFailed(format!("date column: {e}")))?;
        let is_finalized: bool = row
            .try_get("is_finalized")
            .map_err(|e| StoreError::QueryFailed(format!("is_finalized column: {e}")))?;

        Ok(AppointmentInterval {
            id,
            date: Self::parse_date("date", &date)?,
            start: Self::minute_column(row, "start_minute")?,
            end: Self::minute_column(row, "end_minute")?,
            is_finalized,
        })
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AuxiliaryHourRecord, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let date: String = row
            .try_get("date")
            .map_err(|e| StoreError::QueryFailed(format!("date column: {e}")))?;
        let kind: String = row
            .try_get("kind")
            .map_err(|e| StoreError::QueryFailed(format!("kind column: {e}")))?;
        let is_finalized: bool = row
            .try_get("is_finalized")
            .map_err(|e| StoreError::QueryFailed(format!("is_finalized column: {e}")))?;
        let description: String = row
            .try_get("description")
            .map_err(|e| StoreError::QueryFailed(format!("description column: {e}")))?;

        Ok(AuxiliaryHourRecord {
            id,
            date: Self::parse_date("date", &date)?,
            kind: kind.parse::<AuxiliaryKind>().map_err(StoreError::QueryFailed)?,
            duration_minutes: Self::minute_column(row, "duration_minutes")?,
            is_finalized,
            description,
        })
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<AuxiliaryHourRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM auxiliary_hours WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("SELECT auxiliary hour: {e}")))?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    /// Explain why a guarded write touched no rows.
    async fn write_refused(&self, id: &str) -> StoreError {
        match self.fetch_record(id).await {
            Ok(Some(record)) if record.is_finalized => StoreError::Finalized(id.to_string()),
            Ok(Some(_)) => StoreError::Storage(format!("write to {id} affected no rows")),
            Ok(None) => StoreError::NotFound(id.to_string()),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl AppointmentSource for SqliteStore {
    async fn list_appointments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AppointmentInterval>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM appointments WHERE date >= ?1 AND date <= ?2 ORDER BY date, start_minute",
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT appointments: {e}")))?;

        rows.iter().map(Self::row_to_appointment).collect()
    }
}

#[async_trait]
impl AuxiliaryHourStore for SqliteStore {
    async fn list_auxiliary_hours(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AuxiliaryHourRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM auxiliary_hours WHERE date >= ?1 AND date <= ?2 ORDER BY date, iid",
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT auxiliary hours: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn create_auxiliary_hour(
        &self,
        date: NaiveDate,
        kind: AuxiliaryKind,
        duration_minutes: u32,
        description: &str,
    ) -> Result<AuxiliaryHourRecord, StoreError> {
        let record = AuxiliaryHourRecord {
            id: Uuid::new_v4().to_string(),
            date,
            kind,
            duration_minutes,
            is_finalized: false,
            description: description.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO auxiliary_hours (id, date, kind, duration_minutes, is_finalized, description)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(&record.id)
        .bind(record.date.to_string())
        .bind(record.kind.as_str())
        .bind(i64::from(record.duration_minutes))
        .bind(&record.description)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT auxiliary hour failed: {e}")))?;

        debug!(id = %record.id, date = %date, kind = %kind, "Created auxiliary hour");
        Ok(record)
    }

    async fn update_auxiliary_hour(
        &self,
        id: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<AuxiliaryHourRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE auxiliary_hours
            SET duration_minutes = ?2, description = ?3
            WHERE id = ?1 AND is_finalized = 0
            "#,
        )
        .bind(id)
        .bind(i64::from(duration_minutes))
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("UPDATE auxiliary hour failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(self.write_refused(id).await);
        }

        self.fetch_record(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_auxiliary_hour(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM auxiliary_hours WHERE id = ?1 AND is_finalized = 0")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE auxiliary hour failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(self.write_refused(id).await);
        }
        debug!(id, "Deleted auxiliary hour");
        Ok(())
    }
}

#[async_trait]
impl ServiceHistorySource for SqliteStore {
    async fn service_history(
        &self,
        subject: &str,
        service_kind: &str,
    ) -> Result<ServiceDurationHistory, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT date, minutes FROM service_durations
            WHERE subject = ?1 AND service_kind = ?2
            ORDER BY date DESC, iid DESC
            "#,
        )
        .bind(subject)
        .bind(service_kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT service durations: {e}")))?;

        let mut samples = Vec::with_capacity(rows.len());
        for row in &rows {
            let date: String = row
                .try_get("date")
                .map_err(|e| StoreError::QueryFailed(format!("date column: {e}")))?;
            let minutes: i64 = row
                .try_get("minutes")
                .map_err(|e| StoreError::QueryFailed(format!("minutes column: {e}")))?;
            samples.push(DurationSample::new(Self::parse_date("date", &date)?, minutes));
        }

        let standard: Option<i64> =
            sqlx::query("SELECT minutes FROM service_standards WHERE service_kind = ?1")
                .bind(service_kind)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("SELECT service standard: {e}")))?
                .map(|row| row.try_get::<i64, _>("minutes"))
                .transpose()
                .map_err(|e| StoreError::QueryFailed(format!("minutes column: {e}")))?;

        Ok(ServiceDurationHistory::new(samples, standard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn appointments_filtered_by_date() {
        let store = test_store().await;
        store
            .upsert_appointment(AppointmentInterval::new(day(2), 600, 660))
            .await
            .unwrap();
        store
            .upsert_appointment(AppointmentInterval::new(day(2), 540, 600).finalized())
            .await
            .unwrap();
        store
            .upsert_appointment(AppointmentInterval::new(day(20), 540, 600))
            .await
            .unwrap();

        let rows = store.list_appointments(day(1), day(10)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, 540);
        assert!(rows[0].is_finalized);
        assert!(!rows[1].is_finalized);
    }

    #[tokio::test]
    async fn auxiliary_crud() {
        let store = test_store().await;
        let record = store
            .create_auxiliary_hour(day(2), AuxiliaryKind::Travel, 80, "Travel time")
            .await
            .unwrap();

        let listed = store.list_auxiliary_hours(day(2), day(2)).await.unwrap();
        assert_eq!(listed, vec![record.clone()]);

        let updated = store
            .update_auxiliary_hour(&record.id, 60, "Travel time (Mon 09h)")
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 60);
        assert_eq!(updated.description, "Travel time (Mon 09h)");

        store.delete_auxiliary_hour(&record.id).await.unwrap();
        assert!(store.list_auxiliary_hours(day(1), day(31)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalized_record_writes_fail() {
        let store = test_store().await;
        let record = store
            .create_auxiliary_hour(day(2), AuxiliaryKind::Cleaning, 40, "Cleaning")
            .await
            .unwrap();
        assert!(store.finalize_auxiliary_hour(&record.id).await.unwrap());

        let update = store.update_auxiliary_hour(&record.id, 10, "x").await;
        assert!(matches!(update, Err(StoreError::Finalized(_))));

        let delete = store.delete_auxiliary_hour(&record.id).await;
        assert!(matches!(delete, Err(StoreError::Finalized(_))));

        let listed = store.list_auxiliary_hours(day(2), day(2)).await.unwrap();
        assert_eq!(listed[0].duration_minutes, 40);
        assert!(listed[0].is_finalized);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = test_store().await;
        let result = store.update_auxiliary_hour("nope", 10, "x").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn service_history_most_recent_first() {
        let store = test_store().await;
        for (d, minutes) in [(1, 50), (15, 70), (8, 60)] {
            store
                .record_service_duration("Rex", "trim", &DurationSample::new(day(d), minutes))
                .await
                .unwrap();
        }
        store.set_standard_duration("trim", 45).await.unwrap();
        store.set_standard_duration("trim", 50).await.unwrap();

        let history = store.service_history("Rex", "trim").await.unwrap();
        let minutes: Vec<i64> = history.samples.iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![70, 60, 50]);
        assert_eq!(history.standard_duration, Some(50));

        let empty = store.service_history("Rex", "nails").await.unwrap();
        assert!(empty.samples.is_empty());
        assert_eq!(empty.standard_duration, None);
    }

    #[tokio::test]
    async fn backends_agree_on_same_date_sample_order() {
        let sqlite = test_store().await;
        let memory = crate::InMemoryStore::new();
        for minutes in [40, 55, 62] {
            let sample = DurationSample::new(day(4), minutes);
            sqlite
                .record_service_duration("Rex", "bath", &sample)
                .await
                .unwrap();
            memory.record_service_duration("Rex", "bath", sample).await;
        }

        let from_sqlite = sqlite.service_history("Rex", "bath").await.unwrap();
        let from_memory = memory.service_history("Rex", "bath").await.unwrap();
        assert_eq!(from_sqlite.samples, from_memory.samples);
        assert_eq!(from_sqlite.samples[0].minutes, 62);
    }

    #[tokio::test]
    async fn remove_appointment_reports_presence() {
        let store = test_store().await;
        let id = store
            .upsert_appointment(AppointmentInterval::new(day(3), 540, 600))
            .await
            .unwrap();
        assert!(store.remove_appointment(&id).await.unwrap());
        assert!(!store.remove_appointment(&id).await.unwrap());
    }
}
