//! Configuration loading, validation, and management for groomdesk.
//!
//! Loads configuration from `~/.groomdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chrono::Weekday;
use groomdesk_core::time::{GRID_MINUTES, parse_hhmm};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.groomdesk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Business hours and slot selection policy
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Duration estimation policy
    #[serde(default)]
    pub estimation: EstimationConfig,

    /// Travel/cleaning reconciliation policy
    #[serde(default)]
    pub auxiliary: AuxiliaryConfig,

    /// Storage backend selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Expected travel minutes by weekday and hour
    #[serde(default)]
    pub travel_times: Vec<TravelTimeConfig>,

    /// Scheduled reconciliation runs
    #[serde(default)]
    pub routines: Vec<RoutineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Opening time, `HH:MM`
    #[serde(default = "default_day_start")]
    pub day_start: String,

    /// Closing time, `HH:MM`
    #[serde(default = "default_day_end")]
    pub day_end: String,

    /// Proposed when no gap qualifies (and on an empty day)
    #[serde(default = "default_fallback_start")]
    pub fallback_start: String,

    /// Gaps whose waste differs by at most this much are tied; the earlier wins
    #[serde(default = "default_waste_tolerance")]
    pub waste_tolerance_minutes: u32,
}

fn default_day_start() -> String {
    "08:00".into()
}
fn default_day_end() -> String {
    "21:00".into()
}
fn default_fallback_start() -> String {
    "09:00".into()
}
fn default_waste_tolerance() -> u32 {
    30
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            fallback_start: default_fallback_start(),
            waste_tolerance_minutes: default_waste_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Floor for any estimate
    #[serde(default = "default_minimum_minutes")]
    pub minimum_minutes: u32,

    /// Per-item estimate when neither history nor a standard duration exists
    #[serde(default = "default_item_minutes")]
    pub default_item_minutes: u32,
}

fn default_minimum_minutes() -> u32 {
    60
}
fn default_item_minutes() -> u32 {
    30
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            minimum_minutes: default_minimum_minutes(),
            default_item_minutes: default_item_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxiliaryConfig {
    /// Travel minutes when the travel table has no entry
    #[serde(default = "default_travel_fallback")]
    pub travel_fallback_minutes: u32,

    /// Cleaning minutes booked for every day with open appointments
    #[serde(default = "default_cleaning_minutes")]
    pub cleaning_minutes: u32,
}

fn default_travel_fallback() -> u32 {
    80
}
fn default_cleaning_minutes() -> u32 {
    40
}

impl Default for AuxiliaryConfig {
    fn default() -> Self {
        Self {
            travel_fallback_minutes: default_travel_fallback(),
            cleaning_minutes: default_cleaning_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database file (defaults to `~/.groomdesk/groomdesk.sqlite`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

/// One row of the travel-time table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTimeConfig {
    /// Weekday name or abbreviation ("mon", "Tuesday", ...)
    pub weekday: String,

    /// Hour of day of the first open appointment, 0-23
    pub hour: u32,

    /// Expected one-way travel minutes
    pub minutes: u32,
}

impl TravelTimeConfig {
    pub fn parsed_weekday(&self) -> Result<Weekday, ConfigError> {
        self.weekday.parse::<Weekday>().map_err(|_| {
            ConfigError::ValidationError(format!("unknown weekday in travel_times: {}", self.weekday))
        })
    }
}

/// Largest `days_back` / `days_ahead` a routine may use.
pub const MAX_ROUTINE_SPAN_DAYS: u32 = 366;

/// Configuration for a scheduled reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineConfig {
    /// Unique name for this routine
    pub name: String,

    /// Cron expression (5-field: minute hour dom month dow)
    pub schedule: String,

    /// Days before today included in the reconciled window
    #[serde(default)]
    pub days_back: u32,

    /// Days after today included in the reconciled window
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,

    /// Whether this routine is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_days_ahead() -> u32 {
    14
}

impl AppConfig {
    /// Load configuration from the default path (~/.groomdesk/config.toml).
    ///
    /// Environment overrides:
    /// - `GROOMDESK_STORE` — storage backend
    /// - `GROOMDESK_DB_PATH` — SQLite file
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(backend) = std::env::var("GROOMDESK_STORE") {
            config.store.backend = backend;
        }

        if let Ok(path) = std::env::var("GROOMDESK_DB_PATH") {
            config.store.path = Some(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".groomdesk")
    }

    /// Resolved SQLite database path.
    pub fn database_path(&self) -> PathBuf {
        match &self.store.path {
            Some(path) => PathBuf::from(path),
            None => Self::config_dir().join("groomdesk.sqlite"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let day_start = parse_time("scheduling.day_start", &self.scheduling.day_start)?;
        let day_end = parse_time("scheduling.day_end", &self.scheduling.day_end)?;
        let fallback = parse_time("scheduling.fallback_start", &self.scheduling.fallback_start)?;

        if day_start >= day_end {
            return Err(ConfigError::ValidationError(
                "scheduling.day_start must be before scheduling.day_end".into(),
            ));
        }

        for (name, value) in [
            ("scheduling.day_start", day_start),
            ("scheduling.day_end", day_end),
            ("scheduling.fallback_start", fallback),
            ("estimation.minimum_minutes", self.estimation.minimum_minutes),
        ] {
            if value % GRID_MINUTES != 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a multiple of {GRID_MINUTES} minutes"
                )));
            }
        }

        if self.estimation.minimum_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "estimation.minimum_minutes must be > 0".into(),
            ));
        }

        if self.auxiliary.cleaning_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "auxiliary.cleaning_minutes must be > 0".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store backend: {other}"
                )));
            }
        }

        for entry in &self.travel_times {
            entry.parsed_weekday()?;
            if entry.hour > 23 {
                return Err(ConfigError::ValidationError(format!(
                    "travel_times hour out of range 0-23: {}",
                    entry.hour
                )));
            }
        }

        for routine in &self.routines {
            if routine.schedule.split_whitespace().count() != 5 {
                return Err(ConfigError::ValidationError(format!(
                    "routine '{}' needs a 5-field cron schedule",
                    routine.name
                )));
            }
            if routine.days_back > MAX_ROUTINE_SPAN_DAYS || routine.days_ahead > MAX_ROUTINE_SPAN_DAYS {
                return Err(ConfigError::ValidationError(format!(
                    "routine '{}' window must stay within {MAX_ROUTINE_SPAN_DAYS} days each way",
                    routine.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheduling: SchedulingConfig::default(),
            estimation: EstimationConfig::default(),
            auxiliary: AuxiliaryConfig::default(),
            store: StoreConfig::default(),
            travel_times: vec![],
            routines: vec![],
        }
    }
}

fn parse_time(field: &str, value: &str) -> Result<u32, ConfigError> {
    parse_hhmm(value)
        .map_err(|e| ConfigError::ValidationError(format!("{field}: {e}")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
