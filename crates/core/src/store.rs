//! Storage traits — the read/write contracts the engine consumes.
//!
//! The booking subsystem implements these; the engine never bypasses them.
//! Implementations: SQLite, in-memory (for testing and ephemeral runs),
//! and a config-backed travel-time table.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};

use crate::appointment::AppointmentInterval;
use crate::auxiliary::{AuxiliaryHourRecord, AuxiliaryKind};
use crate::error::StoreError;
use crate::service::ServiceDurationHistory;

/// Read access to booked appointments.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// All appointments whose date falls in `from..=to`, finalized or not.
    async fn list_appointments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AppointmentInterval>, StoreError>;
}

/// Read/write access to auxiliary hour records.
///
/// `update_auxiliary_hour` and `delete_auxiliary_hour` must fail with
/// [`StoreError::Finalized`] when the target is finalized.
#[async_trait]
pub trait AuxiliaryHourStore: Send + Sync {
    /// All auxiliary records whose date falls in `from..=to`.
    async fn list_auxiliary_hours(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AuxiliaryHourRecord>, StoreError>;

    /// Create a new, open record.
    async fn create_auxiliary_hour(
        &self,
        date: NaiveDate,
        kind: AuxiliaryKind,
        duration_minutes: u32,
        description: &str,
    ) -> Result<AuxiliaryHourRecord, StoreError>;

    async fn update_auxiliary_hour(
        &self,
        id: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<AuxiliaryHourRecord, StoreError>;

    async fn delete_auxiliary_hour(&self, id: &str) -> Result<(), StoreError>;
}

/// Expected one-way travel minutes by weekday and hour of day.
#[async_trait]
pub trait TravelTimeLookup: Send + Sync {
    /// `Ok(None)` when no entry exists; the caller applies its fallback.
    async fn lookup_travel_minutes(
        &self,
        weekday: Weekday,
        hour: u32,
    ) -> Result<Option<u32>, StoreError>;
}

/// Historical durations feeding the duration estimator.
#[async_trait]
pub trait ServiceHistorySource: Send + Sync {
    /// Past durations for `service_kind` performed on `subject`,
    /// most recent first, with the service's standard duration attached.
    async fn service_history(
        &self,
        subject: &str,
        service_kind: &str,
    ) -> Result<ServiceDurationHistory, StoreError>;
}
