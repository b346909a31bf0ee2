//! Duration estimation from historical per-service samples.
//!
//! Each line item is estimated on its own, then the item estimates are
//! summed, snapped to the 15-minute grid and floored at the policy minimum.
//!
//! Per item:
//! 1. Two or more samples: take the two most recent, `d1` and `d2`, and
//!    their grid roundings `i1`, `i2`.
//!    - `i1 == i2`: use it.
//!    - Otherwise, if the mean of `d1` and `d2` lies within one minute of a
//!      grid point, use that grid point.
//!    - Otherwise prefer `i1` when `d1 > d2`; else use whichever of `i1`/`i2`
//!      a third sample rounds to; else whichever is closer to the mean.
//! 2. One sample: its grid rounding.
//! 3. No samples: the rounded standard duration, or the policy default.

use groomdesk_config::EstimationConfig;
use groomdesk_core::error::{Error, ScheduleError};
use groomdesk_core::service::{LineItem, ServiceDurationHistory};
use groomdesk_core::store::ServiceHistorySource;
use groomdesk_core::time::round_to_grid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Floor and per-item default used by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatePolicy {
    pub minimum_minutes: u32,
    pub default_item_minutes: u32,
}

impl Default for EstimatePolicy {
    fn default() -> Self {
        Self {
            minimum_minutes: 60,
            default_item_minutes: 30,
        }
    }
}

impl EstimatePolicy {
    pub fn from_config(config: &EstimationConfig) -> Self {
        Self {
            minimum_minutes: config.minimum_minutes,
            default_item_minutes: config.default_item_minutes,
        }
    }
}

/// Where a per-item estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateBasis {
    /// The two most recent samples agreed after rounding
    Agreement,
    /// The samples straddled a grid point
    Average,
    /// Tie-break between two disagreeing samples
    TieBreak,
    SingleSample,
    Standard,
    Default,
}

/// Estimate for one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEstimate {
    pub line_item: LineItem,
    pub minutes: u32,
    pub basis: EstimateBasis,
}

/// Estimate for a whole prospective appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub total_minutes: u32,
    pub items: Vec<ItemEstimate>,
}

fn grid(minutes: i64) -> i64 {
    round_to_grid(minutes as f64)
}

fn to_minutes(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn validate(history: &ServiceDurationHistory) -> Result<(), ScheduleError> {
    if let Some(sample) = history.samples.iter().find(|s| s.minutes < 0) {
        return Err(ScheduleError::NegativeDuration {
            what: format!("sample on {}", sample.date),
            minutes: sample.minutes,
        });
    }
    if let Some(standard) = history.standard_duration.filter(|m| *m < 0) {
        return Err(ScheduleError::NegativeDuration {
            what: "standard duration".into(),
            minutes: standard,
        });
    }
    Ok(())
}

/// Estimate a single line item from its history.
pub fn estimate_item(
    history: &ServiceDurationHistory,
    policy: &EstimatePolicy,
) -> Result<(u32, EstimateBasis), ScheduleError> {
    validate(history)?;

    let (minutes, basis) = match history.samples.as_slice() {
        [first, second, rest @ ..] => {
            let (d1, d2) = (first.minutes, second.minutes);
            let (i1, i2) = (grid(d1), grid(d2));
            let avg = (d1 as f64 + d2 as f64) / 2.0;
            let avg_grid = round_to_grid(avg);

            if i1 == i2 {
                (i1, EstimateBasis::Agreement)
            } else if (avg - avg_grid as f64).abs() < 1.0 {
                (avg_grid, EstimateBasis::Average)
            } else if d1 > d2 {
                (i1, EstimateBasis::TieBreak)
            } else {
                let third = rest.first().map(|s| grid(s.minutes));
                let chosen = match third {
                    Some(i3) if i3 == i1 => i1,
                    Some(i3) if i3 == i2 => i2,
                    _ if (i1 as f64 - avg).abs() <= (i2 as f64 - avg).abs() => i1,
                    _ => i2,
                };
                (chosen, EstimateBasis::TieBreak)
            }
        }
        [only] => (grid(only.minutes), EstimateBasis::SingleSample),
        [] => match history.standard_duration {
            Some(standard) => (grid(standard), EstimateBasis::Standard),
            None => (
                grid(i64::from(policy.default_item_minutes)),
                EstimateBasis::Default,
            ),
        },
    };

    Ok((to_minutes(minutes), basis))
}

/// Sum per-item estimates, snap to the grid and apply the floor.
pub fn estimate_duration<'a, I>(histories: I, policy: &EstimatePolicy) -> Result<u32, ScheduleError>
where
    I: IntoIterator<Item = &'a ServiceDurationHistory>,
{
    let mut total: i64 = 0;
    for history in histories {
        let (minutes, _) = estimate_item(history, policy)?;
        total += i64::from(minutes);
    }
    Ok(finish_total(total, policy))
}

fn finish_total(total: i64, policy: &EstimatePolicy) -> u32 {
    let floor = grid(i64::from(policy.minimum_minutes));
    to_minutes(grid(total).max(floor))
}

/// Fetch each line item's history from `source` and estimate the appointment.
pub async fn estimate_line_items(
    source: &dyn ServiceHistorySource,
    items: &[LineItem],
    policy: &EstimatePolicy,
) -> Result<Estimate, Error> {
    let mut estimates = Vec::with_capacity(items.len());
    let mut total: i64 = 0;

    for item in items {
        let history = source.service_history(&item.subject, &item.service_kind).await?;
        let (minutes, basis) = estimate_item(&history, policy)?;
        debug!(
            subject = %item.subject,
            service = %item.service_kind,
            minutes,
            ?basis,
            "Estimated line item"
        );
        total += i64::from(minutes);
        estimates.push(ItemEstimate {
            line_item: item.clone(),
            minutes,
            basis,
        });
    }

    Ok(Estimate {
        total_minutes: finish_total(total, policy),
        items: estimates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use groomdesk_core::service::DurationSample;

    fn history(minutes: &[i64]) -> ServiceDurationHistory {
        // Most recent first: index 0 is the newest sample.
        let samples = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
                    - chrono::Duration::days(i as i64 * 7);
                DurationSample::new(date, *m)
            })
            .collect();
        ServiceDurationHistory::new(samples, None)
    }

    fn item(h: &ServiceDurationHistory) -> (u32, EstimateBasis) {
        estimate_item(h, &EstimatePolicy::default()).unwrap()
    }

    #[test]
    fn huge_samples_saturate_instead_of_overflowing() {
        let (minutes, _) = item(&history(&[i64::MAX, i64::MAX / 2]));
        assert_eq!(minutes, u32::MAX);
        let (minutes, _) = item(&history(&[i64::MAX / 2 + 100, i64::MAX / 2 + 10]));
        assert_eq!(minutes, u32::MAX);
    }

    #[test]
    fn agreeing_samples() {
        assert_eq!(item(&history(&[62, 58])), (60, EstimateBasis::Agreement));
    }

    #[test]
    fn straddling_samples_use_average() {
        // 50 -> 45, 70 -> 75, mean 60 is on the grid
        assert_eq!(item(&history(&[50, 70])), (60, EstimateBasis::Average));
        // mean 60.5 is within one minute of 60
        assert_eq!(item(&history(&[51, 70])), (60, EstimateBasis::Average));
    }

    #[test]
    fn most_recent_wins_when_longer() {
        // 68 -> 75, 52 -> 45, mean 60 on grid -> average
        assert_eq!(item(&history(&[68, 52])).0, 60);
        // 68 -> 75, 50 -> 45, mean 59 -> |59-60| = 1, not < 1 -> d1 > d2 -> 75
        assert_eq!(item(&history(&[68, 50])), (75, EstimateBasis::TieBreak));
    }

    #[test]
    fn third_sample_breaks_the_tie() {
        // d1 = 40 (45), d2 = 55 (60), mean 47.5 (grid 45, off by 2.5)
        assert_eq!(item(&history(&[40, 55, 61])), (60, EstimateBasis::TieBreak));
        assert_eq!(item(&history(&[40, 55, 44])), (45, EstimateBasis::TieBreak));
    }

    #[test]
    fn closest_to_mean_without_matching_third() {
        // mean 47.5: 45 is 2.5 away, 60 is 12.5 away
        assert_eq!(item(&history(&[40, 55])), (45, EstimateBasis::TieBreak));
        assert_eq!(item(&history(&[40, 55, 90])), (45, EstimateBasis::TieBreak));
        // d1 = 35 (30), d2 = 55 (60), mean 45 on grid -> average
        assert_eq!(item(&history(&[35, 55])), (45, EstimateBasis::Average));
        // d1 = 37 (30), d2 = 53 (60), mean 45 on grid -> average
        assert_eq!(item(&history(&[37, 53])).0, 45);
        // d1 = 34 (30), d2 = 50 (45), mean 42 -> 45 is 3 away, 30 is 12 away
        assert_eq!(item(&history(&[34, 50])), (45, EstimateBasis::TieBreak));
    }

    #[test]
    fn single_sample_rounds() {
        assert_eq!(item(&history(&[52])), (45, EstimateBasis::SingleSample));
        assert_eq!(item(&history(&[53])), (60, EstimateBasis::SingleSample));
    }

    #[test]
    fn standard_and_default_fallbacks() {
        assert_eq!(
            item(&ServiceDurationHistory::standard_only(50)),
            (45, EstimateBasis::Standard)
        );
        assert_eq!(
            item(&ServiceDurationHistory::default()),
            (30, EstimateBasis::Default)
        );
    }

    #[test]
    fn standard_durations_without_history_sum() {
        let histories = [
            ServiceDurationHistory::standard_only(45),
            ServiceDurationHistory::standard_only(50),
        ];
        assert_eq!(estimate_duration(&histories, &EstimatePolicy::default()).unwrap(), 90);
    }

    #[test]
    fn empty_list_hits_floor() {
        let none: [ServiceDurationHistory; 0] = [];
        assert_eq!(estimate_duration(&none, &EstimatePolicy::default()).unwrap(), 60);
    }

    #[test]
    fn small_totals_are_floored() {
        let histories = [history(&[20]), ServiceDurationHistory::default()];
        // 15 + 30 = 45 -> floor 60
        assert_eq!(estimate_duration(&histories, &EstimatePolicy::default()).unwrap(), 60);
    }

    #[test]
    fn results_are_grid_aligned_and_floored() {
        for a in (0..200).step_by(7) {
            for b in (0..200).step_by(11) {
                for c in [None, Some(3), Some(88)] {
                    let mut minutes = vec![a, b];
                    if let Some(c) = c {
                        minutes.push(c);
                    }
                    let total =
                        estimate_duration(&[history(&minutes)], &EstimatePolicy::default()).unwrap();
                    assert_eq!(total % 15, 0, "{minutes:?}");
                    assert!(total >= 60, "{minutes:?}");
                }
            }
        }
    }

    #[test]
    fn negative_samples_rejected() {
        let err = estimate_item(&history(&[60, -5]), &EstimatePolicy::default()).unwrap_err();
        assert!(matches!(err, ScheduleError::NegativeDuration { minutes: -5, .. }));

        let err = estimate_item(
            &ServiceDurationHistory::standard_only(-30),
            &EstimatePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::NegativeDuration { .. }));
    }

    #[test]
    fn custom_floor_applies() {
        let policy = EstimatePolicy {
            minimum_minutes: 90,
            default_item_minutes: 30,
        };
        let none: [ServiceDurationHistory; 0] = [];
        assert_eq!(estimate_duration(&none, &policy).unwrap(), 90);
    }
}
