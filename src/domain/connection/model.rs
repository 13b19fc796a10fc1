//! Service connection (customer account) entity

use serde::{Deserialize, Serialize};

use crate::domain::ids::deserialize_id;
use crate::domain::reading::MeterReading;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Connection {
    /// Human-facing label: account number if known, else the raw id.
    pub fn label(&self) -> &str {
        self.account_number.as_deref().unwrap_or(&self.id)
    }
}

/// A connection together with the reading that is waiting to be billed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillableConnection {
    pub connection: Connection,
    pub reading: MeterReading,
}

impl BillableConnection {
    pub fn is_billable(&self) -> bool {
        self.reading.is_billable() && self.reading.connection_id == self.connection.id
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::reading::ReadingStatus;

    fn billable(reading_connection: &str) -> BillableConnection {
        BillableConnection {
            connection: Connection {
                id: "c1".into(),
                account_number: Some("ACC-001".into()),
                customer_name: Some("Dela Cruz".into()),
                address: None,
                status: Some("active".into()),
            },
            reading: MeterReading {
                id: "r1".into(),
                connection_id: reading_connection.into(),
                previous_reading: Decimal::ZERO,
                present_reading: Decimal::new(5, 0),
                status: ReadingStatus::Approved,
                is_billed: false,
                reading_date: None,
            },
        }
    }

    #[test]
    fn label_prefers_account_number() {
        let mut b = billable("c1");
        assert_eq!(b.connection.label(), "ACC-001");
        b.connection.account_number = None;
        assert_eq!(b.connection.label(), "c1");
    }

    #[test]
    fn reading_must_belong_to_connection() {
        assert!(billable("c1").is_billable());
        assert!(!billable("c2").is_billable());
    }
}
