//! Auxiliary-hours reconciliation.
//!
//! For every date in a window, the travel and cleaning records that *should*
//! exist (one open record of each kind when the date has open appointments,
//! none otherwise) are compared with the open records that *do* exist, and
//! the store is sent the creates, updates and deletes needed to converge.
//! Finalized records are filtered out before any write is planned.
//!
//! Dates are independent. A failure on one date is recorded in the summary
//! and the run moves on; the procedure is safe to re-run.

use chrono::{Datelike, NaiveDate};
use groomdesk_config::AuxiliaryConfig;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_core::auxiliary::{AuxiliaryHourRecord, AuxiliaryKind};
use groomdesk_core::error::StoreError;
use groomdesk_core::store::{AppointmentSource, AuxiliaryHourStore, TravelTimeLookup};
use groomdesk_core::time::format_hhmm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Policy values for derived auxiliary records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryPolicy {
    /// Used when the travel table has no entry for (weekday, hour)
    pub travel_fallback_minutes: u32,
    pub cleaning_minutes: u32,
}

impl Default for AuxiliaryPolicy {
    fn default() -> Self {
        Self {
            travel_fallback_minutes: 80,
            cleaning_minutes: 40,
        }
    }
}

impl AuxiliaryPolicy {
    pub fn from_config(config: &AuxiliaryConfig) -> Self {
        Self {
            travel_fallback_minutes: config.travel_fallback_minutes,
            cleaning_minutes: config.cleaning_minutes,
        }
    }
}

/// A counter per auxiliary kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub travel: u32,
    pub cleaning: u32,
}

impl KindCounts {
    fn bump(&mut self, kind: AuxiliaryKind) {
        match kind {
            AuxiliaryKind::Travel => self.travel += 1,
            AuxiliaryKind::Cleaning => self.cleaning += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.travel + self.cleaning
    }
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub added: KindCounts,
    pub updated: KindCounts,
    pub removed: KindCounts,
    /// Every date visited, including dates that failed
    pub processed_dates: Vec<NaiveDate>,
    /// One entry per failed date (or failed fetch)
    pub errors: Vec<String>,
}

impl ReconcileSummary {
    fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            added: KindCounts::default(),
            updated: KindCounts::default(),
            removed: KindCounts::default(),
            processed_dates: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// No errors were recorded; the window has converged.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_changes(&self) -> u32 {
        self.added.total() + self.updated.total() + self.removed.total()
    }
}

/// One write the reconciler intends to issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuxAction {
    Create {
        kind: AuxiliaryKind,
        duration_minutes: u32,
        description: String,
    },
    Update {
        id: String,
        kind: AuxiliaryKind,
        duration_minutes: u32,
        description: String,
    },
    Delete {
        id: String,
        kind: AuxiliaryKind,
    },
}

/// The auxiliary records a date should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredHours {
    pub travel_minutes: u32,
    pub travel_description: String,
    pub cleaning_minutes: u32,
    pub cleaning_description: String,
}

impl DesiredHours {
    fn for_kind(&self, kind: AuxiliaryKind) -> (u32, &str) {
        match kind {
            AuxiliaryKind::Travel => (self.travel_minutes, &self.travel_description),
            AuxiliaryKind::Cleaning => (self.cleaning_minutes, &self.cleaning_description),
        }
    }
}

/// The writes that take a date's open records to `desired`.
///
/// `records` may contain finalized entries; they are ignored. With no
/// desired hours, every open record is deleted. Among duplicates the first
/// listed record is kept.
pub fn plan_date(desired: Option<&DesiredHours>, records: &[&AuxiliaryHourRecord]) -> Vec<AuxAction> {
    let mut actions = Vec::new();

    for kind in AuxiliaryKind::ALL {
        let open: Vec<&AuxiliaryHourRecord> = records
            .iter()
            .copied()
            .filter(|r| r.kind == kind && r.is_open())
            .collect();

        let Some(desired) = desired else {
            actions.extend(open.iter().map(|r| AuxAction::Delete {
                id: r.id.clone(),
                kind,
            }));
            continue;
        };

        let (minutes, description) = desired.for_kind(kind);
        match open.split_first() {
            None => actions.push(AuxAction::Create {
                kind,
                duration_minutes: minutes,
                description: description.to_string(),
            }),
            Some((keep, duplicates)) => {
                if keep.duration_minutes != minutes {
                    actions.push(AuxAction::Update {
                        id: keep.id.clone(),
                        kind,
                        duration_minutes: minutes,
                        description: description.to_string(),
                    });
                }
                actions.extend(duplicates.iter().map(|r| AuxAction::Delete {
                    id: r.id.clone(),
                    kind,
                }));
            }
        }
    }

    actions
}

/// Keeps travel and cleaning records in step with open appointments.
///
/// Collaborators are injected; overlapping runs on the same reconciler are
/// serialized so two runs never race to create the same (date, kind) record.
pub struct Reconciler {
    appointments: Arc<dyn AppointmentSource>,
    auxiliary: Arc<dyn AuxiliaryHourStore>,
    travel: Arc<dyn TravelTimeLookup>,
    policy: AuxiliaryPolicy,
    run_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        appointments: Arc<dyn AppointmentSource>,
        auxiliary: Arc<dyn AuxiliaryHourStore>,
        travel: Arc<dyn TravelTimeLookup>,
    ) -> Self {
        Self {
            appointments,
            auxiliary,
            travel,
            policy: AuxiliaryPolicy::default(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: AuxiliaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Desired hours for a date, or `None` when it has no open appointments.
    pub async fn desired_hours(
        &self,
        date: NaiveDate,
        appointments: &[&AppointmentInterval],
    ) -> Result<Option<DesiredHours>, StoreError> {
        let Some(first_start) = appointments
            .iter()
            .filter(|a| a.is_open())
            .map(|a| a.start)
            .min()
        else {
            return Ok(None);
        };

        let weekday = date.weekday();
        let hour = first_start / 60;
        let travel_minutes = match self.travel.lookup_travel_minutes(weekday, hour).await? {
            Some(minutes) => minutes,
            None => {
                debug!(%date, ?weekday, hour, "No travel-time entry, using fallback");
                self.policy.travel_fallback_minutes
            }
        };

        Ok(Some(DesiredHours {
            travel_minutes,
            travel_description: format!(
                "Travel time {date} ({weekday}, first appointment {})",
                format_hhmm(first_start)
            ),
            cleaning_minutes: self.policy.cleaning_minutes,
            cleaning_description: format!("Cleaning time {date}"),
        }))
    }

    /// Compute the writes for `from..=to` without issuing them.
    pub async fn plan(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Vec<AuxAction>)>, StoreError> {
        let (appointments, records) = self.fetch(from, to).await?;
        let mut plans = Vec::new();
        for date in Self::dates(from, to, &appointments, &records) {
            let day_appointments = Self::on_date(&appointments, date);
            let day_records: Vec<&AuxiliaryHourRecord> =
                records.iter().filter(|r| r.date == date).collect();
            let desired = self.desired_hours(date, &day_appointments).await?;
            let actions = plan_date(desired.as_ref(), &day_records);
            if !actions.is_empty() {
                plans.push((date, actions));
            }
        }
        Ok(plans)
    }

    /// Converge the auxiliary records for every date in `from..=to`.
    ///
    /// Always returns a summary; a non-empty `errors` list means the window
    /// only partially converged and the run should be retried.
    pub async fn reconcile(&self, from: NaiveDate, to: NaiveDate) -> ReconcileSummary {
        let _guard = self.run_lock.lock().await;
        let mut summary = ReconcileSummary::new(from, to);

        if from > to {
            summary
                .errors
                .push(format!("Invalid range: {from} is after {to}"));
            return summary;
        }

        info!(%from, %to, "Reconciling auxiliary hours");

        let (appointments, records) = match self.fetch(from, to).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%from, %to, error = %e, "Failed to load reconciliation inputs");
                summary.errors.push(format!("{from}..{to}: {e}"));
                return summary;
            }
        };

        for date in Self::dates(from, to, &appointments, &records) {
            summary.processed_dates.push(date);
            let day_appointments = Self::on_date(&appointments, date);
            let day_records: Vec<&AuxiliaryHourRecord> =
                records.iter().filter(|r| r.date == date).collect();

            if let Err(e) = self
                .reconcile_date(date, &day_appointments, &day_records, &mut summary)
                .await
            {
                warn!(%date, error = %e, "Reconciliation failed for date");
                summary.errors.push(format!("{date}: {e}"));
            }
        }

        info!(
            %from,
            %to,
            added = summary.added.total(),
            updated = summary.updated.total(),
            removed = summary.removed.total(),
            dates = summary.processed_dates.len(),
            errors = summary.errors.len(),
            "Reconciliation finished"
        );
        summary
    }

    async fn reconcile_date(
        &self,
        date: NaiveDate,
        appointments: &[&AppointmentInterval],
        records: &[&AuxiliaryHourRecord],
        summary: &mut ReconcileSummary,
    ) -> Result<(), StoreError> {
        let desired = self.desired_hours(date, appointments).await?;

        for action in plan_date(desired.as_ref(), records) {
            match action {
                AuxAction::Create {
                    kind,
                    duration_minutes,
                    description,
                } => {
                    let record = self
                        .auxiliary
                        .create_auxiliary_hour(date, kind, duration_minutes, &description)
                        .await?;
                    debug!(%date, %kind, id = %record.id, duration_minutes, "Created auxiliary hour");
                    summary.added.bump(kind);
                }
                AuxAction::Update {
                    id,
                    kind,
                    duration_minutes,
                    description,
                } => {
                    self.auxiliary
                        .update_auxiliary_hour(&id, duration_minutes, &description)
                        .await?;
                    debug!(%date, %kind, %id, duration_minutes, "Updated auxiliary hour");
                    summary.updated.bump(kind);
                }
                AuxAction::Delete { id, kind } => {
                    self.auxiliary.delete_auxiliary_hour(&id).await?;
                    debug!(%date, %kind, %id, "Deleted auxiliary hour");
                    summary.removed.bump(kind);
                }
            }
        }
        Ok(())
    }

    async fn fetch(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(Vec<AppointmentInterval>, Vec<AuxiliaryHourRecord>), StoreError> {
        let appointments = self.appointments.list_appointments(from, to).await?;
        let records = self.auxiliary.list_auxiliary_hours(from, to).await?;
        Ok((appointments, records))
    }

    /// Dates carrying appointments or auxiliary records, in order.
    fn dates(
        from: NaiveDate,
        to: NaiveDate,
        appointments: &[AppointmentInterval],
        records: &[AuxiliaryHourRecord],
    ) -> BTreeSet<NaiveDate> {
        appointments
            .iter()
            .map(|a| a.date)
            .chain(records.iter().map(|r| r.date))
            .filter(|d| *d >= from && *d <= to)
            .collect()
    }

    fn on_date(appointments: &[AppointmentInterval], date: NaiveDate) -> Vec<&AppointmentInterval> {
        appointments.iter().filter(|a| a.date == date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Weekday;
    use groomdesk_store::{InMemoryStore, TravelTimeTable};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn record(date: NaiveDate, kind: AuxiliaryKind, minutes: u32) -> AuxiliaryHourRecord {
        AuxiliaryHourRecord {
            id: String::new(),
            date,
            kind,
            duration_minutes: minutes,
            is_finalized: false,
            description: String::new(),
        }
    }

    fn reconciler(store: &InMemoryStore, travel: TravelTimeTable) -> Reconciler {
        let store = Arc::new(store.clone());
        Reconciler::new(store.clone(), store, Arc::new(travel))
    }

    fn open_of(records: &[AuxiliaryHourRecord], kind: AuxiliaryKind) -> Vec<&AuxiliaryHourRecord> {
        records.iter().filter(|r| r.kind == kind && r.is_open()).collect()
    }

    #[test]
    fn plan_creates_missing_and_fixes_drift() {
        let desired = DesiredHours {
            travel_minutes: 60,
            travel_description: "t".into(),
            cleaning_minutes: 40,
            cleaning_description: "c".into(),
        };
        let mut travel = record(day(2), AuxiliaryKind::Travel, 80);
        travel.id = "t1".into();

        let actions = plan_date(Some(&desired), &[&travel]);
        assert_eq!(
            actions,
            vec![
                AuxAction::Update {
                    id: "t1".into(),
                    kind: AuxiliaryKind::Travel,
                    duration_minutes: 60,
                    description: "t".into(),
                },
                AuxAction::Create {
                    kind: AuxiliaryKind::Cleaning,
                    duration_minutes: 40,
                    description: "c".into(),
                },
            ]
        );
    }

    #[test]
    fn plan_ignores_finalized_records() {
        let mut finalized = record(day(2), AuxiliaryKind::Travel, 80);
        finalized.id = "f1".into();
        finalized.is_finalized = true;
        assert!(plan_date(None, &[&finalized]).is_empty());
    }

    #[tokio::test]
    async fn creates_travel_and_cleaning_for_open_day() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 600, 660)).await;
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        let travel = TravelTimeTable::new().with_entry(Weekday::Mon, 9, 60);

        let summary = reconciler(&store, travel).reconcile(day(1), day(7)).await;
        assert!(summary.is_clean());
        assert_eq!(summary.added, KindCounts { travel: 1, cleaning: 1 });
        assert_eq!(summary.processed_dates, vec![day(2)]);

        let records = store.auxiliary_hours().await;
        assert_eq!(open_of(&records, AuxiliaryKind::Travel)[0].duration_minutes, 60);
        assert_eq!(open_of(&records, AuxiliaryKind::Cleaning)[0].duration_minutes, 40);
        assert!(open_of(&records, AuxiliaryKind::Travel)[0].description.contains("09:00"));
    }

    #[tokio::test]
    async fn missing_travel_entry_uses_fallback() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(3), 780, 840)).await;

        reconciler(&store, TravelTimeTable::new()).reconcile(day(3), day(3)).await;

        let records = store.auxiliary_hours().await;
        assert_eq!(open_of(&records, AuxiliaryKind::Travel)[0].duration_minutes, 80);
    }

    #[tokio::test]
    async fn orphaned_records_are_removed() {
        let store = InMemoryStore::new();
        store.add_auxiliary_hour(record(day(4), AuxiliaryKind::Travel, 80)).await;
        store.add_auxiliary_hour(record(day(4), AuxiliaryKind::Cleaning, 40)).await;

        let summary = reconciler(&store, TravelTimeTable::new())
            .reconcile(day(1), day(7))
            .await;
        assert_eq!(summary.removed, KindCounts { travel: 1, cleaning: 1 });
        assert_eq!(summary.added.total(), 0);
        assert!(store.auxiliary_hours().await.is_empty());
    }

    #[tokio::test]
    async fn all_finalized_day_is_treated_as_closed() {
        let store = InMemoryStore::new();
        store
            .add_appointment(AppointmentInterval::new(day(2), 540, 600).finalized())
            .await;
        store.add_auxiliary_hour(record(day(2), AuxiliaryKind::Travel, 60)).await;

        let summary = reconciler(&store, TravelTimeTable::new())
            .reconcile(day(2), day(2))
            .await;
        assert_eq!(summary.removed.travel, 1);
        assert!(store.auxiliary_hours().await.is_empty());
    }

    #[tokio::test]
    async fn duplicates_collapse_to_first_record() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        let first = store.add_auxiliary_hour(record(day(2), AuxiliaryKind::Travel, 60)).await;
        store.add_auxiliary_hour(record(day(2), AuxiliaryKind::Travel, 80)).await;
        store.add_auxiliary_hour(record(day(2), AuxiliaryKind::Travel, 80)).await;
        store.add_auxiliary_hour(record(day(2), AuxiliaryKind::Cleaning, 40)).await;

        let summary = reconciler(&store, TravelTimeTable::new())
            .reconcile(day(2), day(2))
            .await;
        assert_eq!(summary.updated, KindCounts { travel: 1, cleaning: 0 });
        assert_eq!(summary.removed, KindCounts { travel: 2, cleaning: 0 });
        assert_eq!(summary.added.total(), 0);

        let records = store.auxiliary_hours().await;
        let travel = open_of(&records, AuxiliaryKind::Travel);
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].id, first);
        assert_eq!(travel[0].duration_minutes, 80);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        store.add_appointment(AppointmentInterval::new(day(5), 840, 900)).await;
        store.add_auxiliary_hour(record(day(6), AuxiliaryKind::Cleaning, 40)).await;
        store.add_auxiliary_hour(record(day(5), AuxiliaryKind::Travel, 15)).await;
        store.add_auxiliary_hour(record(day(5), AuxiliaryKind::Travel, 15)).await;
        let reconciler = reconciler(&store, TravelTimeTable::new().with_entry(Weekday::Thu, 14, 95));

        let first = reconciler.reconcile(day(1), day(7)).await;
        assert!(first.total_changes() > 0);

        let second = reconciler.reconcile(day(1), day(7)).await;
        assert!(second.is_clean());
        assert_eq!(second.total_changes(), 0);
    }

    #[tokio::test]
    async fn finalized_records_are_never_written() {
        let store = InMemoryStore::new();
        let mut invoiced = record(day(2), AuxiliaryKind::Travel, 60);
        invoiced.is_finalized = true;
        let invoiced_id = store.add_auxiliary_hour(invoiced.clone()).await;
        let mut invoiced_other = record(day(3), AuxiliaryKind::Cleaning, 40);
        invoiced_other.is_finalized = true;
        let other_id = store.add_auxiliary_hour(invoiced_other).await;
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;

        let summary = reconciler(&store, TravelTimeTable::new())
            .reconcile(day(1), day(7))
            .await;
        assert!(summary.is_clean());
        // An open travel record is created next to the finalized one.
        assert_eq!(summary.added, KindCounts { travel: 1, cleaning: 1 });

        let writes = store.writes().await;
        assert!(writes.iter().all(|w| w.id() != invoiced_id && w.id() != other_id));
        assert_eq!(store.auxiliary_hours().await.len(), 4);
    }

    #[tokio::test]
    async fn inverted_range_reports_error() {
        let store = InMemoryStore::new();
        let summary = reconciler(&store, TravelTimeTable::new())
            .reconcile(day(7), day(1))
            .await;
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.processed_dates.is_empty());
    }

    /// Delegates to an in-memory store but fails writes on chosen dates.
    struct FlakyStore {
        inner: InMemoryStore,
        failing_date: NaiveDate,
        fail_listing: bool,
    }

    #[async_trait]
    impl AuxiliaryHourStore for FlakyStore {
        async fn list_auxiliary_hours(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<AuxiliaryHourRecord>, StoreError> {
            if self.fail_listing {
                return Err(StoreError::QueryFailed("connection reset".into()));
            }
            self.inner.list_auxiliary_hours(from, to).await
        }

        async fn create_auxiliary_hour(
            &self,
            date: NaiveDate,
            kind: AuxiliaryKind,
            duration_minutes: u32,
            description: &str,
        ) -> Result<AuxiliaryHourRecord, StoreError> {
            if date == self.failing_date {
                return Err(StoreError::Storage("disk full".into()));
            }
            self.inner
                .create_auxiliary_hour(date, kind, duration_minutes, description)
                .await
        }

        async fn update_auxiliary_hour(
            &self,
            id: &str,
            duration_minutes: u32,
            description: &str,
        ) -> Result<AuxiliaryHourRecord, StoreError> {
            self.inner
                .update_auxiliary_hour(id, duration_minutes, description)
                .await
        }

        async fn delete_auxiliary_hour(&self, id: &str) -> Result<(), StoreError> {
            // Simulates the record being invoiced between listing and deleting.
            Err(StoreError::Finalized(id.to_string()))
        }
    }

    #[tokio::test]
    async fn failing_date_does_not_stop_the_run() {
        let inner = InMemoryStore::new();
        inner.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        inner.add_appointment(AppointmentInterval::new(day(3), 540, 600)).await;
        let flaky = Arc::new(FlakyStore {
            inner: inner.clone(),
            failing_date: day(2),
            fail_listing: false,
        });
        let reconciler = Reconciler::new(
            Arc::new(inner.clone()),
            flaky,
            Arc::new(TravelTimeTable::new()),
        );

        let summary = reconciler.reconcile(day(1), day(7)).await;
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("2026-03-02"));
        assert!(summary.errors[0].contains("disk full"));
        assert_eq!(summary.added, KindCounts { travel: 1, cleaning: 1 });
        assert_eq!(summary.processed_dates, vec![day(2), day(3)]);
    }

    #[tokio::test]
    async fn finalized_rejection_is_surfaced_not_swallowed() {
        let inner = InMemoryStore::new();
        inner.add_auxiliary_hour(record(day(4), AuxiliaryKind::Travel, 80)).await;
        let flaky = Arc::new(FlakyStore {
            inner: inner.clone(),
            failing_date: day(1),
            fail_listing: false,
        });
        let reconciler = Reconciler::new(
            Arc::new(inner.clone()),
            flaky,
            Arc::new(TravelTimeTable::new()),
        );

        let summary = reconciler.reconcile(day(1), day(7)).await;
        assert_eq!(summary.removed.total(), 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("finalized"));
    }

    #[tokio::test]
    async fn failed_fetch_still_returns_summary() {
        let inner = InMemoryStore::new();
        inner.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        let flaky = Arc::new(FlakyStore {
            inner: inner.clone(),
            failing_date: day(1),
            fail_listing: true,
        });
        let reconciler = Reconciler::new(
            Arc::new(inner.clone()),
            flaky,
            Arc::new(TravelTimeTable::new()),
        );

        let summary = reconciler.reconcile(day(1), day(7)).await;
        assert!(!summary.is_clean());
        assert!(summary.errors[0].contains("connection reset"));
        assert_eq!(summary.total_changes(), 0);
    }

    #[tokio::test]
    async fn plan_matches_what_reconcile_does() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        store.add_auxiliary_hour(record(day(3), AuxiliaryKind::Cleaning, 40)).await;
        let reconciler = reconciler(&store, TravelTimeTable::new());

        let plan = reconciler.plan(day(1), day(7)).await.unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].0, day(2));
        assert_eq!(plan[0].1.len(), 2);
        assert!(matches!(plan[1].1[0], AuxAction::Delete { .. }));
        assert!(store.writes().await.is_empty());

        let summary = reconciler.reconcile(day(1), day(7)).await;
        assert_eq!(summary.total_changes(), 3);
        assert!(reconciler.plan(day(1), day(7)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_runs_do_not_duplicate_records() {
        let store = InMemoryStore::new();
        store.add_appointment(AppointmentInterval::new(day(2), 540, 600)).await;
        let reconciler = Arc::new(reconciler(&store, TravelTimeTable::new()));

        let a = tokio::spawn({
            let r = reconciler.clone();
            async move { r.reconcile(day(1), day(7)).await }
        });
        let b = tokio::spawn({
            let r = reconciler.clone();
            async move { r.reconcile(day(1), day(7)).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(a.added.total() + b.added.total(), 2);
        assert_eq!(store.auxiliary_hours().await.len(), 2);
    }

    #[test]
    fn summary_serializes() {
        let summary = ReconcileSummary::new(day(1), day(7));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("processed_dates"));
        assert!(json.contains("\"travel\":0"));
    }
}
