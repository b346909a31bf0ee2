//! `groomdesk daemon` — Run configured reconcile routines.

use std::sync::Arc;

use groomdesk_scheduler::RoutineRunner;
use tracing::{info, warn};

use super::backend::{Backend, CliResult, load_config};
use super::reconcile::print_summary;

pub async fn run() -> CliResult {
    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    let reconciler = Arc::new(backend.reconciler(&config)?);

    println!("🐾 groomdesk daemon — starting");
    println!("   Store:    {}", config.store.backend);
    println!("   Routines: {}", config.routines.len());

    if config.routines.is_empty() {
        println!();
        println!("   No routines configured. Add one to config.toml:");
        println!();
        println!("   [[routines]]");
        println!("   name = \"nightly\"");
        println!("   schedule = \"0 2 * * *\"");
        return Ok(());
    }

    let runner = RoutineRunner::new(reconciler);
    let errors = runner.load_routines(&config.routines).await;
    for err in &errors {
        warn!("Routine load error: {err}");
    }
    info!(
        loaded = config.routines.len() - errors.len(),
        total = config.routines.len(),
        "Routines loaded from config"
    );
    for routine in runner.list_routines().await {
        let status = if routine.enabled { "✅" } else { "⏸️ " };
        println!(
            "   {status} {:<20} {:<16} -{}d/+{}d",
            routine.name, routine.schedule, routine.days_back, routine.days_ahead
        );
    }

    let (mut reports, handle) = runner.start();
    loop {
        tokio::select! {
            report = reports.recv() => {
                let Some(report) = report else { break };
                println!("🔁 {} at {}", report.routine, report.fired_at.format("%Y-%m-%d %H:%M"));
                print_summary(&report.summary);
            }
            _ = tokio::signal::ctrl_c() => {
                println!("👋 Shutting down");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}
