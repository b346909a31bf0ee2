//! Slot allocation inside a bounded workday.
//!
//! Free gaps between committed intervals are collected, snapped to the
//! 15-minute grid, and the gap that wastes the least time wins, with the
//! earlier gap preferred whenever two candidates' waste lies within the
//! tolerance band. The trailing gap doubles as the "straight after the last
//! booking" candidate. When nothing fits, a fixed fallback start is returned;
//! it is not checked for overlap, so callers validate with
//! [`crate::overlap`] before committing.

use chrono::NaiveDate;
use groomdesk_config::SchedulingConfig;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_core::error::ScheduleError;
use groomdesk_core::time::{ceil_to_grid, parse_hhmm};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Business hours and tie-breaking used by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPolicy {
    pub day_start: u32,
    pub day_end: u32,
    pub fallback_start: u32,
    pub waste_tolerance: u32,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            day_start: 480,
            day_end: 1260,
            fallback_start: 540,
            waste_tolerance: 30,
        }
    }
}

impl SlotPolicy {
    pub fn from_config(config: &SchedulingConfig) -> Result<Self, ScheduleError> {
        let policy = Self {
            day_start: parse_hhmm(&config.day_start)?,
            day_end: parse_hhmm(&config.day_end)?,
            fallback_start: parse_hhmm(&config.fallback_start)?,
            waste_tolerance: config.waste_tolerance_minutes,
        };
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), ScheduleError> {
        if self.day_start >= self.day_end {
            return Err(ScheduleError::InvalidBusinessHours {
                start: self.day_start,
                end: self.day_end,
            });
        }
        Ok(())
    }
}

/// A free stretch of the day, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub start: u32,
    pub end: u32,
}

impl Gap {
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a proposed start was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Nothing booked; the policy's opening default was proposed
    EmptyDay,
    /// A qualifying gap
    Gap,
    /// Last resort; may overlap existing bookings
    Fallback,
}

/// A proposed start with its end and provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotProposal {
    pub start: u32,
    pub end: u32,
    pub source: SlotSource,
}

impl SlotProposal {
    fn new(start: u32, required: u32, source: SlotSource) -> Self {
        Self {
            start,
            end: start.saturating_add(required),
            source,
        }
    }
}

/// Free gaps inside business hours, in chronological order.
///
/// Overlapping or unsorted input is tolerated: a running end-of-busy cursor
/// is advanced past every interval.
pub fn free_gaps(existing: &[(u32, u32)], policy: &SlotPolicy) -> Vec<Gap> {
    let mut sorted: Vec<(u32, u32)> = existing.to_vec();
    sorted.sort_by_key(|&(start, _)| start);

    let mut gaps = Vec::new();
    let mut cursor = policy.day_start;
    for (start, end) in sorted {
        let gap_end = start.min(policy.day_end);
        if gap_end > cursor {
            gaps.push(Gap {
                start: cursor,
                end: gap_end,
            });
        }
        cursor = cursor.max(end);
    }
    if cursor < policy.day_end {
        gaps.push(Gap {
            start: cursor,
            end: policy.day_end,
        });
    }
    gaps
}

/// Propose a start for an appointment of `required` minutes.
pub fn propose_slot(
    existing: &[(u32, u32)],
    required: u32,
    policy: &SlotPolicy,
) -> Result<SlotProposal, ScheduleError> {
    policy.validate()?;
    if let Some(&(start, end)) = existing.iter().find(|(start, end)| end < start) {
        return Err(ScheduleError::InvalidInterval {
            start: start.into(),
            end: end.into(),
        });
    }

    if existing.is_empty()
        && policy.fallback_start >= policy.day_start
        && policy.fallback_start.saturating_add(required) <= policy.day_end
    {
        return Ok(SlotProposal::new(policy.fallback_start, required, SlotSource::EmptyDay));
    }

    let mut best: Option<(Gap, u32)> = None;
    for gap in free_gaps(existing, policy) {
        if gap.len() < required {
            continue;
        }
        let usable = Gap {
            start: ceil_to_grid(gap.start),
            end: gap.end,
        };
        if usable.len() < required {
            continue;
        }
        let waste = usable.len() - required;

        best = match best {
            None => Some((usable, waste)),
            Some((kept, kept_waste)) => {
                if waste.abs_diff(kept_waste) <= policy.waste_tolerance || waste >= kept_waste {
                    Some((kept, kept_waste))
                } else {
                    Some((usable, waste))
                }
            }
        };
    }

    if let Some((gap, waste)) = best {
        debug!(start = gap.start, waste, "Selected gap");
        return Ok(SlotProposal::new(gap.start, required, SlotSource::Gap));
    }

    debug!(required, "No gap fits, using fallback start");
    Ok(SlotProposal::new(policy.fallback_start, required, SlotSource::Fallback))
}

/// Best start (minutes from midnight) for `required` minutes.
pub fn best_slot(
    existing: &[(u32, u32)],
    required: u32,
    policy: &SlotPolicy,
) -> Result<u32, ScheduleError> {
    propose_slot(existing, required, policy).map(|p| p.start)
}

/// Propose a slot on `date` given appointments that may span several days.
///
/// Finalized and open appointments both occupy time.
pub fn propose_slot_on(
    appointments: &[AppointmentInterval],
    date: NaiveDate,
    required: u32,
    policy: &SlotPolicy,
) -> Result<SlotProposal, ScheduleError> {
    let busy: Vec<(u32, u32)> = appointments
        .iter()
        .filter(|a| a.date == date)
        .map(|a| (a.start, a.end))
        .collect();
    propose_slot(&busy, required, policy)
}
