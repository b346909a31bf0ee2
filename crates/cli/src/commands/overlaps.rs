//! `groomdesk overlaps` — Check two intervals for overlap.

use super::backend::CliResult;
use groomdesk_core::time::format_hhmm;
use groomdesk_scheduler::overlaps;

pub fn run(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> CliResult {
    for (start, end) in [(a_start, a_end), (b_start, b_end)] {
        if start > end {
            return Err(format!(
                "Interval {}-{} ends before it starts",
                format_hhmm(start),
                format_hhmm(end)
            )
            .into());
        }
    }

    let a = format!("{}-{}", format_hhmm(a_start), format_hhmm(a_end));
    let b = format!("{}-{}", format_hhmm(b_start), format_hhmm(b_end));
    if overlaps(a_start, a_end, b_start, b_end) {
        println!("⚠️  {a} overlaps {b}");
    } else {
        println!("✅ {a} and {b} do not overlap");
    }
    Ok(())
}
