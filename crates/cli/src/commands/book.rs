//! `groomdesk book` — Record an appointment, refusing overlaps.

use chrono::NaiveDate;
use groomdesk_core::appointment::AppointmentInterval;
use groomdesk_scheduler::find_conflicts;

use super::backend::{Backend, CliResult, load_config};

pub async fn run(date: NaiveDate, start: u32, end: u32, finalized: bool) -> CliResult {
    let mut candidate = AppointmentInterval::new(date, start, end);
    if finalized {
        candidate = candidate.finalized();
    }
    candidate.validate()?;

    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    let existing = backend.appointments().list_appointments(date, date).await?;

    let conflicts = find_conflicts(&candidate, &existing);
    if !conflicts.is_empty() {
        println!("❌ {date} {} collides with:", candidate.span_label());
        for other in &conflicts {
            println!("   • {} ({})", other.span_label(), other.id);
        }
        return Err(format!("{} overlapping appointment(s)", conflicts.len()).into());
    }

    let id = backend.insert_appointment(candidate.clone()).await?;
    println!("✅ Booked {date} {} ({id})", candidate.span_label());
    Ok(())
}
