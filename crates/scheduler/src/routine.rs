//! Scheduled reconciliation routines.
//!
//! A routine pairs a 5-field cron expression (`minute hour dom month dow`)
//! with a window relative to the current day. The runner ticks once a minute,
//! reconciles the window of every due routine, and emits the summaries on a
//! channel.

use crate::reconcile::{ReconcileSummary, Reconciler};
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, Timelike};
use groomdesk_config::RoutineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

// ── Cron expressions ────────────────────────────────────────────────────────

/// One cron field as a bitset of allowed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CronField(u64);

impl CronField {
    fn parse(field: &str, min: u32, max: u32) -> Result<Self, String> {
        let mut bits = 0u64;
        for part in field.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step.parse().map_err(|_| format!("Invalid step: {step}"))?;
                    if step == 0 {
                        return Err("Step cannot be zero".into());
                    }
                    (range, step)
                }
                None => (part, 1),
            };

            let (start, end) = match range {
                "*" => (min, max),
                r if r.contains('-') => {
                    let (a, b) = r.split_once('-').unwrap_or((r, r));
                    (number(a, min, max)?, number(b, min, max)?)
                }
                // `N/S` runs from N to the top of the field
                r if step > 1 => (number(r, min, max)?, max),
                r => {
                    let n = number(r, min, max)?;
                    (n, n)
                }
            };
            if start > end {
                return Err(format!("Range {start}-{end} is backwards"));
            }

            for v in (start..=end).step_by(step as usize) {
                bits |= 1 << v;
            }
        }
        Ok(Self(bits))
    }

    fn contains(&self, value: u32) -> bool {
        value < 64 && self.0 & (1 << value) != 0
    }

    #[cfg(test)]
    fn values(&self) -> Vec<u32> {
        (0..64).filter(|v| self.contains(*v)).collect()
    }
}

fn number(text: &str, min: u32, max: u32) -> Result<u32, String> {
    let n: u32 = text
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {text}"))?;
    if n < min || n > max {
        return Err(format!("{n} out of range {min}-{max}"));
    }
    Ok(n)
}

/// A parsed cron schedule. Day-of-week accepts 0-7, both ends meaning Sunday.
///
/// Every field must match, including day-of-month and day-of-week together:
/// `0 9 13 * 5` fires only on a Friday the 13th, not on every 13th and every
/// Friday as in classic cron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minutes: CronField,
    hours: CronField,
    days_of_month: CronField,
    months: CronField,
    days_of_week: CronField,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(format!(
                "Expected 5 fields (minute hour dom month dow), got {}",
                fields.len()
            ));
        };

        let mut days_of_week = CronField::parse(dow, 0, 7)?;
        if days_of_week.contains(7) {
            days_of_week.0 |= 1;
        }

        Ok(Self {
            minutes: CronField::parse(minute, 0, 59)?,
            hours: CronField::parse(hour, 0, 23)?,
            days_of_month: CronField::parse(dom, 1, 31)?,
            months: CronField::parse(month, 1, 12)?,
            days_of_week,
        })
    }

    pub fn matches(&self, at: &NaiveDateTime) -> bool {
        self.minutes.contains(at.minute())
            && self.hours.contains(at.hour())
            && self.days_of_month.contains(at.day())
            && self.months.contains(at.month())
            && self.days_of_week.contains(at.weekday().num_days_from_sunday())
    }
}

// ── Routines ────────────────────────────────────────────────────────────────

/// A named, scheduled reconciliation of a window around today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRoutine {
    pub name: String,
    pub schedule: String,
    pub days_back: u32,
    pub days_ahead: u32,
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<NaiveDateTime>,
}

impl ReconcileRoutine {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            days_back: 0,
            days_ahead: 14,
            enabled: true,
            last_run: None,
        }
    }

    pub fn from_config(config: &RoutineConfig) -> Self {
        Self {
            name: config.name.clone(),
            schedule: config.schedule.clone(),
            days_back: config.days_back,
            days_ahead: config.days_ahead,
            enabled: config.enabled,
            last_run: None,
        }
    }

    /// The inclusive date window this routine reconciles on `today`, or
    /// `None` when either end falls outside the representable calendar.
    pub fn window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = today.checked_sub_days(Days::new(u64::from(self.days_back)))?;
        let to = today.checked_add_days(Days::new(u64::from(self.days_ahead)))?;
        Some((from, to))
    }

    /// Due at `now`, and not already run during this minute.
    fn is_due(&self, schedule: &CronSchedule, now: &NaiveDateTime) -> bool {
        if !self.enabled || !schedule.matches(now) {
            return false;
        }
        match &self.last_run {
            Some(last) => {
                last.date() != now.date() || last.hour() != now.hour() || last.minute() != now.minute()
            }
            None => true,
        }
    }
}

/// Outcome of one routine firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineReport {
    pub routine: String,
    pub fired_at: NaiveDateTime,
    pub summary: ReconcileSummary,
}

/// Runs reconcile routines on their cron schedules.
pub struct RoutineRunner {
    routines: Arc<RwLock<BTreeMap<String, (ReconcileRoutine, CronSchedule)>>>,
    reconciler: Arc<Reconciler>,
}

impl RoutineRunner {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            routines: Arc::new(RwLock::new(BTreeMap::new())),
            reconciler,
        }
    }

    /// Register a routine; the schedule is validated here.
    pub async fn add_routine(&self, routine: ReconcileRoutine) -> Result<(), String> {
        let schedule = CronSchedule::parse(&routine.schedule)?;
        info!(
            name = %routine.name,
            schedule = %routine.schedule,
            days_back = routine.days_back,
            days_ahead = routine.days_ahead,
            "Adding reconcile routine"
        );
        self.routines
            .write()
            .await
            .insert(routine.name.clone(), (routine, schedule));
        Ok(())
    }

    pub async fn remove_routine(&self, name: &str) -> bool {
        self.routines.write().await.remove(name).is_some()
    }

    pub async fn list_routines(&self) -> Vec<ReconcileRoutine> {
        self.routines
            .read()
            .await
            .values()
            .map(|(routine, _)| routine.clone())
            .collect()
    }

    pub async fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.routines.write().await.get_mut(name) {
            Some((routine, _)) => {
                routine.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Register every configured routine, collecting per-routine errors.
    pub async fn load_routines(&self, configs: &[RoutineConfig]) -> Vec<String> {
        let mut errors = Vec::new();
        for config in configs {
            if let Err(e) = self.add_routine(ReconcileRoutine::from_config(config)).await {
                errors.push(format!("Routine '{}': {e}", config.name));
            }
        }
        errors
    }

    /// Fire every routine due at `now` and return their reports.
    pub async fn run_due(&self, now: NaiveDateTime) -> Vec<RoutineReport> {
        run_due(&self.routines, &self.reconciler, now).await
    }

    /// Start the background loop, ticking once a minute on local time.
    ///
    /// Reports are sent on the returned channel; the loop stops when the
    /// receiver is dropped.
    pub fn start(&self) -> (mpsc::Receiver<RoutineReport>, tokio::task::JoinHandle<()>) {
        let routines = self.routines.clone();
        let reconciler = self.reconciler.clone();
        let (tx, rx) = mpsc::channel::<RoutineReport>(16);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                let now = Local::now().naive_local();
                for report in run_due(&routines, &reconciler, now).await {
                    if tx.send(report).await.is_err() {
                        debug!("Routine report receiver dropped, stopping routine loop");
                        return;
                    }
                }
            }
        });

        (rx, handle)
    }
}

async fn run_due(
    routines: &RwLock<BTreeMap<String, (ReconcileRoutine, CronSchedule)>>,
    reconciler: &Reconciler,
    now: NaiveDateTime,
) -> Vec<RoutineReport> {
    // Claim due routines under the write lock so a minute fires once.
    let due: Vec<ReconcileRoutine> = {
        let mut map = routines.write().await;
        map.values_mut()
            .filter(|(routine, schedule)| routine.is_due(schedule, &now))
            .map(|(routine, _)| {
                routine.last_run = Some(now);
                routine.clone()
            })
            .collect()
    };

    let mut reports = Vec::with_capacity(due.len());
    for routine in due {
        let Some((from, to)) = routine.window(now.date()) else {
            warn!(
                name = %routine.name,
                days_back = routine.days_back,
                days_ahead = routine.days_ahead,
                "Routine window out of calendar range, skipping"
            );
            continue;
        };
        info!(name = %routine.name, %from, %to, "Reconcile routine triggered");
        let summary = reconciler.reconcile(from, to).await;
        if !summary.is_clean() {
            warn!(name = %routine.name, errors = summary.errors.len(), "Routine finished with errors");
        }
        reports.push(RoutineReport {
            routine: routine.name,
            fired_at: now,
            summary,
        });
    }
    reports
}
