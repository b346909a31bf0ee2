//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::NaiveDate;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_core::auxiliary::{AuxiliaryHourRecord, AuxiliaryKind};
use groomdesk_core::error::StoreError;
use groomdesk_core::service::{DurationSample, ServiceDurationHistory};
use groomdesk_core::store::{AppointmentSource, AuxiliaryHourStore, ServiceHistorySource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A write issued against the auxiliary hour table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Create { id: String },
    Update { id: String },
    Delete { id: String },
}

impl WriteOp {
    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create { id } | WriteOp::Update { id } | WriteOp::Delete { id } => id,
        }
    }
}

#[derive(Default)]
struct Tables {
    appointments: Vec<AppointmentInterval>,
    auxiliary: Vec<AuxiliaryHourRecord>,
    samples: HashMap<(String, String), Vec<DurationSample>>,
    standards: HashMap<String, i64>,
    writes: Vec<WriteOp>,
}

/// An in-memory store that keeps every table in a Vec or map.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an appointment, assigning an id when it has none.
    pub async fn add_appointment(&self, mut appointment: AppointmentInterval) -> String {
        if appointment.id.is_empty() {
            appointment.id = Uuid::new_v4().to_string();
        }
        let id = appointment.id.clone();
        self.tables.write().await.appointments.push(appointment);
        id
    }

    /// Remove an appointment by id (the booking subsystem cancelling it).
    pub async fn remove_appointment(&self, id: &str) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.appointments.len();
        tables.appointments.retain(|a| a.id != id);
        tables.appointments.len() < before
    }

    /// Mark an appointment as invoiced.
    pub async fn finalize_appointment(&self, id: &str) -> bool {
        let mut tables = self.tables.write().await;
        match tables.appointments.iter_mut().find(|a| a.id == id) {
            Some(appointment) => {
                appointment.is_finalized = true;
                true
            }
            None => false,
        }
    }

    /// Insert an auxiliary record directly, bypassing the write log.
    pub async fn add_auxiliary_hour(&self, mut record: AuxiliaryHourRecord) -> String {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        self.tables.write().await.auxiliary.push(record);
        id
    }

    /// Record an observed service duration.
    pub async fn record_service_duration(
        &self,
        subject: &str,
        service_kind: &str,
        sample: DurationSample,
    ) {
        self.tables
            .write()
            .await
            .samples
            .entry((subject.to_string(), service_kind.to_string()))
            .or_default()
            .push(sample);
    }

    pub async fn set_standard_duration(&self, service_kind: &str, minutes: i64) {
        self.tables
            .write()
            .await
            .standards
            .insert(service_kind.to_string(), minutes);
    }

    /// Snapshot of all auxiliary records.
    pub async fn auxiliary_hours(&self) -> Vec<AuxiliaryHourRecord> {
        self.tables.read().await.auxiliary.clone()
    }

    /// Every create/update/delete issued through the store trait, in order.
    pub async fn writes(&self) -> Vec<WriteOp> {
        self.tables.read().await.writes.clone()
    }
}

#[async_trait]
impl AppointmentSource for InMemoryStore {
    async fn list_appointments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AppointmentInterval>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<AppointmentInterval> = tables
            .appointments
            .iter()
            .filter(|a| a.date >= from && a.date <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.start));
        Ok(rows)
    }
}

#[async_trait]
impl AuxiliaryHourStore for InMemoryStore {
    async fn list_auxiliary_hours(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AuxiliaryHourRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .auxiliary
            .iter()
            .filter(|r| r.date >= from && r.date <= to)
            .cloned()
            .collect())
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
        let mut tables = self.tables.write().await;
        tables.writes.push(WriteOp::Create {
            id: record.id.clone(),
        });
        tables.auxiliary.push(record.clone());
        Ok(record)
    }

    async fn update_auxiliary_hour(
        &self,
        id: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<AuxiliaryHourRecord, StoreError> {
        let mut tables = self.tables.write().await;
        tables.writes.push(WriteOp::Update { id: id.to_string() });
        let record = tables
            .auxiliary
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if record.is_finalized {
            return Err(StoreError::Finalized(id.to_string()));
        }
        record.duration_minutes = duration_minutes;
        record.description = description.to_string();
        Ok(record.clone())
    }

    async fn delete_auxiliary_hour(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.writes.push(WriteOp::Delete { id: id.to_string() });
        let position = tables
            .auxiliary
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if tables.auxiliary[position].is_finalized {
            return Err(StoreError::Finalized(id.to_string()));
        }
        tables.auxiliary.remove(position);
        Ok(())
    }
}

#[async_trait]
impl ServiceHistorySource for InMemoryStore {
    async fn service_history(
        &self,
        subject: &str,
        service_kind: &str,
    ) -> Result<ServiceDurationHistory, StoreError> {
        let tables = self.tables.read().await;
        // Newest insertion first, so same-date samples keep that order
        // through the stable date sort.
        let samples: Vec<DurationSample> = tables
            .samples
            .get(&(subject.to_string(), service_kind.to_string()))
            .map(|rows| rows.iter().rev().cloned().collect())
            .unwrap_or_default();
        let standard = tables.standards.get(service_kind).copied();
        Ok(ServiceDurationHistory::new(samples, standard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn finalized_record(date: NaiveDate) -> AuxiliaryHourRecord {
        AuxiliaryHourRecord {
            id: String::new(),
            date,
            kind: AuxiliaryKind::Travel,
            duration_minutes: 60,
            is_finalized: true,
            description: "invoiced".into(),
        }
    }

    #[tokio::test]
    async fn lists_appointments_in_range() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 600, 660)).await;
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        store.add_appointment(AppointmentInterval::new(day(9), 540, 600)).await;

        let rows = store.list_appointments(day(1), day(3)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, 540);
        assert!(rows.iter().all(|a| !a.id.is_empty()));
    }

    #[tokio::test]
    async fn create_update_delete_roundtrip() {
        let store = InMemoryStore::new();
        let created = store
            .create_auxiliary_hour(day(2), AuxiliaryKind::Cleaning, 40, "Cleaning")
            .await
            .unwrap();
        assert!(created.is_open());

        let updated = store
            .update_auxiliary_hour(&created.id, 45, "Cleaning (long)")
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 45);

        store.delete_auxiliary_hour(&created.id).await.unwrap();
        assert!(store.auxiliary_hours().await.is_empty());
        assert_eq!(store.writes().await.len(), 3);
    }

    #[tokio::test]
    async fn finalized_records_reject_writes() {
        let store = InMemoryStore::new();
        let id = store.add_auxiliary_hour(finalized_record(day(2))).await;

        let update = store.update_auxiliary_hour(&id, 10, "x").await;
        assert!(matches!(update, Err(StoreError::Finalized(_))));

        let delete = store.delete_auxiliary_hour(&id).await;
        assert!(matches!(delete, Err(StoreError::Finalized(_))));

        assert_eq!(store.auxiliary_hours().await[0].duration_minutes, 60);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.delete_auxiliary_hour("missing").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn service_history_combines_samples_and_standard() {
        let store = InMemoryStore::new();
        store
            .record_service_duration("Rex", "bath", DurationSample::new(day(1), 50))
            .await;
        store
            .record_service_duration("Rex", "bath", DurationSample::new(day(8), 65))
            .await;
        store.set_standard_duration("bath", 45).await;

        let history = store.service_history("Rex", "bath").await.unwrap();
        assert_eq!(history.samples[0].minutes, 65);
        assert_eq!(history.standard_duration, Some(45));

        let other = store.service_history("Bella", "bath").await.unwrap();
        assert!(other.samples.is_empty());
        assert_eq!(other.standard_duration, Some(45));
    }

    #[tokio::test]
    async fn same_date_samples_newest_insertion_first() {
        let store = InMemoryStore::new();
        for minutes in [40, 55] {
            store
                .record_service_duration("Rex", "bath", DurationSample::new(day(1), minutes))
                .await;
        }
        store
            .record_service_duration("Rex", "bath", DurationSample::new(day(2), 70))
            .await;

        let history = store.service_history("Rex", "bath").await.unwrap();
        let minutes: Vec<i64> = history.samples.iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![70, 55, 40]);
    }

    #[tokio::test]
    async fn cancel_and_finalize_appointments() {
        let store = InMemoryStore::new();
        let a = store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        let b = store.add_appointment(AppointmentInterval::new(day(2), 600, 660)).await;

        assert!(store.finalize_appointment(&a).await);
        assert!(store.remove_appointment(&b).await);
        assert!(!store.remove_appointment(&b).await);

        let rows = store.list_appointments(day(2), day(2)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_finalized);
    }
}
