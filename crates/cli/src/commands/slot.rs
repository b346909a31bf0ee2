//! `groomdesk slot` — Propose a start time given busy intervals.

use super::backend::{CliResult, load_config};
use groomdesk_core::time::format_hhmm;
use groomdesk_scheduler::{SlotPolicy, SlotSource, propose_slot};

pub fn run(busy: &[(u32, u32)], minutes: u32) -> CliResult {
    let config = load_config()?;
    let policy = SlotPolicy::from_config(&config.scheduling)?;
    let proposal = propose_slot(busy, minutes, &policy)?;

    println!(
        "🕘 {}-{} ({minutes} min)",
        format_hhmm(proposal.start),
        format_hhmm(proposal.end)
    );
    println!("   {}", describe(proposal.source));
    Ok(())
}

pub fn describe(source: SlotSource) -> &'static str {
    match source {
        SlotSource::EmptyDay => "Empty day: default opening slot",
        SlotSource::Gap => "Fits a free gap between bookings",
        SlotSource::Fallback => "No gap fits: fallback start, review manually",
    }
}
