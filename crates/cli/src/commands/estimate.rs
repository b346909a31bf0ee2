//! `groomdesk estimate` / `groomdesk suggest` — Appointment length and placement.

use chrono::NaiveDate;
use groomdesk_core::service::LineItem;
use groomdesk_core::time::format_hhmm;
use groomdesk_scheduler::{
    Estimate, EstimateBasis, EstimatePolicy, SlotPolicy, estimate_line_items, propose_slot_on,
};

use super::backend::{Backend, CliResult, load_config};
use super::slot::describe;

fn line_items(subject: &str, services: &[String]) -> Vec<LineItem> {
    services.iter().map(|s| LineItem::new(subject, s.as_str())).collect()
}

fn basis_label(basis: EstimateBasis) -> &'static str {
    match basis {
        EstimateBasis::Agreement => "recent visits agree",
        EstimateBasis::Average => "average of recent visits",
        EstimateBasis::TieBreak => "recent visits disagree",
        EstimateBasis::SingleSample => "one past visit",
        EstimateBasis::Standard => "service standard",
        EstimateBasis::Default => "no history",
    }
}

fn print_estimate(estimate: &Estimate) {
    for item in &estimate.items {
        println!(
            "   {:<24} {:>4} min  ({})",
            item.line_item.service_kind,
            item.minutes,
            basis_label(item.basis)
        );
    }
    println!("   {:-<44}", "");
    println!("   {:<24} {:>4} min", "Total", estimate.total_minutes);
}

pub async fn run(subject: &str, services: &[String]) -> CliResult {
    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    let policy = EstimatePolicy::from_config(&config.estimation);

    let estimate =
        estimate_line_items(backend.history().as_ref(), &line_items(subject, services), &policy)
            .await?;

    println!("⏱️  Estimate for {subject}");
    print_estimate(&estimate);
    Ok(())
}

pub async fn suggest(date: NaiveDate, subject: &str, services: &[String]) -> CliResult {
    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    let estimate = estimate_line_items(
        backend.history().as_ref(),
        &line_items(subject, services),
        &EstimatePolicy::from_config(&config.estimation),
    )
    .await?;

    let booked = backend.appointments().list_appointments(date, date).await?;
    let policy = SlotPolicy::from_config(&config.scheduling)?;
    let proposal = propose_slot_on(&booked, date, estimate.total_minutes, &policy)?;

    println!("⏱️  Estimate for {subject}");
    print_estimate(&estimate);
    println!();
    println!(
        "🕘 {date} {}-{}  ({} already booked)",
        format_hhmm(proposal.start),
        format_hhmm(proposal.end),
        booked.len()
    );
    println!("   {}", describe(proposal.source));
    Ok(())
}
