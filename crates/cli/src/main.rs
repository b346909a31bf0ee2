//! groomdesk CLI — the main entry point.
//!
//! Commands:
//! - `overlaps`   — Check two intervals for overlap
//! - `slot`       — Propose a start time given busy intervals
//! - `estimate`   — Estimate appointment length from service history
//! - `suggest`    — Estimate and place an appointment on a date
//! - `book`       — Record an appointment, rejecting overlaps
//! - `history`    — Seed service duration history
//! - `reconcile`  — Bring travel and cleaning hours in line with bookings
//! - `daemon`     — Run configured reconcile routines
//! - `config`     — Show or initialize configuration

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use groomdesk_core::time::{parse_hhmm, parse_span};

mod commands;

#[derive(Parser)]
#[command(
    name = "groomdesk",
    about = "groomdesk — appointment slotting and auxiliary-hour reconciliation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether [A_START, A_END) and [B_START, B_END) overlap
    Overlaps {
        #[arg(value_parser = parse_hhmm)]
        a_start: u32,
        #[arg(value_parser = parse_hhmm)]
        a_end: u32,
        #[arg(value_parser = parse_hhmm)]
        b_start: u32,
        #[arg(value_parser = parse_hhmm)]
        b_end: u32,
    },

    /// Propose a start time for an appointment of the given length
    Slot {
        /// Busy interval as HH:MM-HH:MM (repeatable)
        #[arg(long = "busy", value_parser = parse_span)]
        busy: Vec<(u32, u32)>,

        /// Required length in minutes
        #[arg(short, long)]
        minutes: u32,
    },

    /// Estimate appointment length from past durations
    Estimate {
        #[arg(long)]
        subject: String,

        /// Service kind (repeatable, one per line item)
        #[arg(long = "service", required = true)]
        services: Vec<String>,
    },

    /// Estimate an appointment and propose a start on DATE
    Suggest {
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        subject: String,

        #[arg(long = "service", required = true)]
        services: Vec<String>,
    },

    /// Book an appointment, refusing overlaps with existing ones
    Book {
        #[arg(long)]
        date: NaiveDate,

        #[arg(long, value_parser = parse_hhmm)]
        start: u32,

        #[arg(long, value_parser = parse_hhmm)]
        end: u32,

        /// Record the appointment as already invoiced
        #[arg(long)]
        finalized: bool,
    },

    /// Seed service duration history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Reconcile travel and cleaning hours for a date range
    Reconcile {
        /// First date (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date (default: FROM + 14 days)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Print planned writes without issuing them
        #[arg(long)]
        dry_run: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run configured reconcile routines until interrupted
    Daemon,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Record one observed duration
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        minutes: i64,
    },
    /// Set a service's standard duration
    Standard {
        #[arg(long)]
        service: String,
        #[arg(long)]
        minutes: i64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Overlaps {
            a_start,
            a_end,
            b_start,
            b_end,
        } => commands::overlaps::run(a_start, a_end, b_start, b_end)?,
        Commands::Slot { busy, minutes } => commands::slot::run(&busy, minutes)?,
        Commands::Estimate { subject, services } => {
            commands::estimate::run(&subject, &services).await?
        }
        Commands::Suggest {
            date,
            subject,
            services,
        } => commands::estimate::suggest(date, &subject, &services).await?,
        Commands::Book {
            date,
            start,
            end,
            finalized,
        } => commands::book::run(date, start, end, finalized).await?,
        Commands::History { action } => match action {
            HistoryAction::Add {
                subject,
                service,
                date,
                minutes,
            } => commands::history::add(&subject, &service, date, minutes).await?,
            HistoryAction::Standard { service, minutes } => {
                commands::history::standard(&service, minutes).await?
            }
        },
        Commands::Reconcile {
            from,
            to,
            dry_run,
            json,
        } => commands::reconcile::run(from, to, dry_run, json).await?,
        Commands::Daemon => commands::daemon::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Init { force } => commands::config_cmd::init(force)?,
            ConfigAction::Path => commands::config_cmd::path()?,
        },
    }

    Ok(())
}
