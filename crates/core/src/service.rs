//! Line items and the historical durations used to estimate them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A (subject, service kind) pair selected for a prospective appointment.
///
/// The subject is typically a dog; the service kind is what is done to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    pub subject: String,
    pub service_kind: String,
}

impl LineItem {
    pub fn new(subject: impl Into<String>, service_kind: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            service_kind: service_kind.into(),
        }
    }
}

/// One past observation of how long a service took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSample {
    pub date: NaiveDate,
    /// Signed so that corrupt negative rows reach validation instead of wrapping.
    pub minutes: i64,
}

impl DurationSample {
    pub fn new(date: NaiveDate, minutes: i64) -> Self {
        Self { date, minutes }
    }
}

/// Past durations for a line item, most recent first, plus the service's
/// configured standard duration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDurationHistory {
    #[serde(default)]
    pub samples: Vec<DurationSample>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_duration: Option<i64>,
}

impl ServiceDurationHistory {
    /// Build a history, ordering samples most-recent-first.
    pub fn new(mut samples: Vec<DurationSample>, standard_duration: Option<i64>) -> Self {
        samples.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            samples,
            standard_duration,
        }
    }

    /// A history with no samples, only a standard duration.
    pub fn standard_only(minutes: i64) -> Self {
        Self {
            samples: Vec::new(),
            standard_duration: Some(minutes),
        }
    }
}
