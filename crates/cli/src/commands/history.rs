//! `groomdesk history` — Seed the estimator's inputs.

use chrono::NaiveDate;
use groomdesk_core::error::ScheduleError;
use groomdesk_core::service::DurationSample;

use super::backend::{Backend, CliResult, load_config};

fn non_negative(what: &str, minutes: i64) -> Result<(), ScheduleError> {
    if minutes < 0 {
        return Err(ScheduleError::NegativeDuration {
            what: what.to_string(),
            minutes,
        });
    }
    Ok(())
}

pub async fn add(subject: &str, service: &str, date: NaiveDate, minutes: i64) -> CliResult {
    non_negative(service, minutes)?;
    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    backend
        .record_sample(subject, service, DurationSample::new(date, minutes))
        .await?;
    println!("📝 Recorded {service} for {subject} on {date}: {minutes} min");
    Ok(())
}

pub async fn standard(service: &str, minutes: i64) -> CliResult {
    non_negative(service, minutes)?;
    let config = load_config()?;
    let backend = Backend::open(&config).await?;
    backend.set_standard(service, minutes).await?;
    println!("📝 Standard duration for {service}: {minutes} min");
    Ok(())
}
