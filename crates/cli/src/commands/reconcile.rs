//! `groomdesk reconcile` — Bring travel and cleaning hours in line with bookings.

use chrono::{Duration, Local, NaiveDate};
use groomdesk_scheduler::{AuxAction, ReconcileSummary};

use super::backend::{Backend, CliResult, load_config};

const DEFAULT_WINDOW_DAYS: i64 = 14;

pub async fn run(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    dry_run: bool,
    json: bool,
) -> CliResult {
    let from = from.unwrap_or_else(|| Local::now().date_naive());
    let to = to.unwrap_or(from + Duration::days(DEFAULT_WINDOW_DAYS));

    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    let reconciler = backend.reconciler(&config)?;

    if dry_run {
        let plan = reconciler.plan(from, to).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }
        if plan.is_empty() {
            println!("✅ {from}..{to} is already in step");
        }
        for (date, actions) in &plan {
            println!("📅 {date}");
            for action in actions {
                println!("   {}", describe(action));
            }
        }
        return Ok(());
    }

    let summary = reconciler.reconcile(from, to).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if summary.is_clean() {
        Ok(())
    } else {
        Err(format!(
            "reconciliation finished with {} error(s); re-run to retry",
            summary.errors.len()
        )
        .into())
    }
}

fn describe(action: &AuxAction) -> String {
    match action {
        AuxAction::Create {
            kind,
            duration_minutes,
            ..
        } => format!("+ create {kind} ({duration_minutes} min)"),
        AuxAction::Update {
            id,
            kind,
            duration_minutes,
            ..
        } => format!("~ update {kind} {id} → {duration_minutes} min"),
        AuxAction::Delete { id, kind } => format!("- delete {kind} {id}"),
    }
}

pub fn print_summary(summary: &ReconcileSummary) {
    let status = if summary.is_clean() { "✅" } else { "⚠️ " };
    println!(
        "{status} Reconciled {}..{} ({} date(s))",
        summary.from,
        summary.to,
        summary.processed_dates.len()
    );
    println!("   {:<10} {:>8} {:>8}", "", "travel", "cleaning");
    for (label, counts) in [
        ("added", summary.added),
        ("updated", summary.updated),
        ("removed", summary.removed),
    ] {
        println!("   {label:<10} {:>8} {:>8}", counts.travel, counts.cleaning);
    }
    for error in &summary.errors {
        println!("   ❌ {error}");
    }
}
