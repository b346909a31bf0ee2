//! Appointment intervals as seen by the scheduling engine.
//!
//! The booking subsystem owns appointments; the engine only reads the
//! date, the time span, and whether the appointment has been finalized.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::time::format_hhmm;

/// An existing or prospective booking on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInterval {
    /// Identity in the booking store (empty for prospective bookings)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Calendar day of the booking
    pub date: NaiveDate,

    /// Start, in minutes from midnight
    pub start: u32,

    /// End (exclusive), in minutes from midnight
    pub end: u32,

    /// True once invoiced or exported
    #[serde(default)]
    pub is_finalized: bool,
}

impl AppointmentInterval {
    /// A prospective, open appointment.
    pub fn new(date: NaiveDate, start: u32, end: u32) -> Self {
        Self {
            id: String::new(),
            date,
            start,
            end,
            is_finalized: false,
        }
    }

    /// Builder-style finalization flag.
    pub fn finalized(mut self) -> Self {
        self.is_finalized = true;
        self
    }

    /// Builder-style identity.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Length of the booking in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the booking is still mutable (not invoiced).
    pub fn is_open(&self) -> bool {
        !self.is_finalized
    }

    /// Reject inverted spans.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.end < self.start {
            return Err(ScheduleError::InvalidInterval {
                start: self.start.into(),
                end: self.end.into(),
            });
        }
        Ok(())
    }

    /// `HH:MM-HH:MM` rendering of the span.
    pub fn span_label(&self) -> String {
        format!("{}-{}", format_hhmm(self.start), format_hhmm(self.end))
    }
}
