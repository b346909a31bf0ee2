//! # groomdesk core
//!
//! Domain types, storage traits, and error definitions for the groomdesk
//! scheduling engine. This crate has no runtime or database dependencies;
//! it defines the model that the store and scheduler crates build on.
//!
//! ## Design Philosophy
//!
//! Every collaborator the engine talks to (appointment listing, auxiliary
//! hour bookkeeping, travel-time lookup, service history) is a trait here.
//! Implementations live in `groomdesk-store`. This enables:
//! - Swapping the backing store via configuration
//! - Testing the reconciler against in-memory or failing stores
//! - A clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod time;
pub mod appointment;
pub mod auxiliary;
pub mod service;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, ScheduleError, StoreError};
pub use time::{GRID_MINUTES, format_hhmm, parse_hhmm, parse_span};
pub use appointment::AppointmentInterval;
pub use auxiliary::{AuxiliaryHourRecord, AuxiliaryKind};
pub use service::{DurationSample, LineItem, ServiceDurationHistory};
pub use store::{AppointmentSource, AuxiliaryHourStore, ServiceHistorySource, TravelTimeLookup};
