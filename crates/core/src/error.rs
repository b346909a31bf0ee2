//! Error types for the groomdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all groomdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Scheduling input errors ---
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// Update or delete attempted against a finalized record.
    #[error("Record {0} is finalized and cannot be modified")]
    Finalized(String),
}

/// Invalid input handed to the estimator or the slot allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Negative duration for {what}: {minutes} minutes")]
    NegativeDuration { what: String, minutes: i64 },

    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval { start: i64, end: i64 },

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid business hours: {start}-{end}")]
    InvalidBusinessHours { start: u32, end: u32 },
}
