//! Travel-time table keyed by weekday and hour of day.

use async_trait::async_trait;
use chrono::Weekday;
use groomdesk_config::{ConfigError, TravelTimeConfig};
use groomdesk_core::error::StoreError;
use groomdesk_core::store::TravelTimeLookup;
use std::collections::HashMap;

/// Expected one-way travel minutes per (weekday, hour).
///
/// A miss returns `None`; the reconciler applies its own fallback.
#[derive(Debug, Clone, Default)]
pub struct TravelTimeTable {
    entries: HashMap<(Weekday, u32), u32>,
}

impl TravelTimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[[travel_times]]` config rows. Later rows win.
    pub fn from_config(rows: &[TravelTimeConfig]) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for row in rows {
            table.insert(row.parsed_weekday()?, row.hour, row.minutes);
        }
        Ok(table)
    }

    pub fn insert(&mut self, weekday: Weekday, hour: u32, minutes: u32) {
        self.entries.insert((weekday, hour), minutes);
    }

    /// Builder-style insert.
    pub fn with_entry(mut self, weekday: Weekday, hour: u32, minutes: u32) -> Self {
        self.insert(weekday, hour, minutes);
        self
    }

    pub fn get(&self, weekday: Weekday, hour: u32) -> Option<u32> {
        self.entries.get(&(weekday, hour)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TravelTimeLookup for TravelTimeTable {
    async fn lookup_travel_minutes(
        &self,
        weekday: Weekday,
        hour: u32,
    ) -> Result<Option<u32>, StoreError> {
        Ok(self.get(weekday, hour))
    }
}
