//! Meter reading domain entity

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::deserialize_id;

/// Reading workflow status as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Submitted,
    Approved,
    Rejected,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A meter reading taken for one connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub connection_id: String,
    /// Meter value at the previous reading (cubic meters)
    pub previous_reading: Decimal,
    /// Meter value now (cubic meters)
    pub present_reading: Decimal,
    pub status: ReadingStatus,
    #[serde(default)]
    pub is_billed: bool,
    #[serde(default)]
    pub reading_date: Option<NaiveDate>,
}

impl MeterReading {
    /// Consumption in cubic meters. A meter that went backwards (replacement,
    /// rollover) counts as zero rather than a credit.
    pub fn consumption(&self) -> Decimal {
        (self.present_reading - self.previous_reading).max(Decimal::ZERO)
    }

    /// Only approved readings that were never billed may produce a bill.
    pub fn is_billable(&self) -> bool {
        self.status == ReadingStatus::Approved && !self.is_billed
    }
}
