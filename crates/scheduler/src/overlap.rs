//! Half-open interval overlap checks.

use groomdesk_core::appointment::AppointmentInterval;

/// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect.
///
/// Touching endpoints do not overlap.
#[inline]
pub fn overlaps(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && a_end > b_start
}

/// Same-day overlap between two appointments.
pub fn intervals_overlap(a: &AppointmentInterval, b: &AppointmentInterval) -> bool {
    a.date == b.date && overlaps(a.start, a.end, b.start, b.end)
}

/// Existing appointments that collide with `candidate`.
///
/// An entry with the same non-empty id as the candidate is the candidate
/// itself being edited and is skipped.
pub fn find_conflicts<'a>(
    candidate: &AppointmentInterval,
    existing: &'a [AppointmentInterval],
) -> Vec<&'a AppointmentInterval> {
    existing
        .iter()
        .filter(|other| candidate.id.is_empty() || other.id != candidate.id)
        .filter(|other| intervals_overlap(candidate, other))
        .collect()
}
