//! Auxiliary hour records: derived travel and cleaning bookkeeping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of auxiliary time a record books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryKind {
    Travel,
    Cleaning,
}

impl AuxiliaryKind {
    pub const ALL: [AuxiliaryKind; 2] = [AuxiliaryKind::Travel, AuxiliaryKind::Cleaning];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuxiliaryKind::Travel => "travel",
            AuxiliaryKind::Cleaning => "cleaning",
        }
    }
}

impl fmt::Display for AuxiliaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuxiliaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "travel" => Ok(AuxiliaryKind::Travel),
            "cleaning" => Ok(AuxiliaryKind::Cleaning),
            other => Err(format!("Unknown auxiliary kind: {other}")),
        }
    }
}

/// A travel- or cleaning-time entry tied to a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryHourRecord {
    /// Identity assigned by the store
    pub id: String,

    pub date: NaiveDate,

    pub kind: AuxiliaryKind,

    pub duration_minutes: u32,

    /// Once finalized the record is never touched again
    #[serde(default)]
    pub is_finalized: bool,

    /// Informational only
    #[serde(default)]
    pub description: String,
}

impl AuxiliaryHourRecord {
    pub fn is_open(&self) -> bool {
        !self.is_finalized
    }
}
