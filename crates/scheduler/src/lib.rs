//! Scheduling engine for groomdesk.
//!
//! - [`overlap`]: half-open interval conflict checks
//! - [`estimate`]: appointment length from historical service durations
//! - [`slot`]: earliest low-waste start time within business hours
//! - [`reconcile`]: travel and cleaning records kept in step with bookings
//! - [`routine`]: cron-scheduled reconciliation runs

pub mod estimate;
pub mod overlap;
pub mod reconcile;
pub mod routine;
pub mod slot;

pub use estimate::{
    Estimate, EstimateBasis, EstimatePolicy, ItemEstimate, estimate_duration, estimate_item,
    estimate_line_items,
};
pub use overlap::{find_conflicts, intervals_overlap, overlaps};
pub use reconcile::{
    AuxAction, AuxiliaryPolicy, DesiredHours, KindCounts, ReconcileSummary, Reconciler, plan_date,
};
pub use routine::{CronSchedule, ReconcileRoutine, RoutineReport, RoutineRunner};
pub use slot::{
    Gap, SlotPolicy, SlotProposal, SlotSource, best_slot, free_gaps, propose_slot, propose_slot_on,
};
