//! Bill domain entity

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::deserialize_id;

/// Payment state of a bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Overdue,
    #[serde(other)]
    Other,
}

impl Default for BillStatus {
    fn default() -> Self {
        Self::Unpaid
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaid => write!(f, "unpaid"),
            Self::PartiallyPaid => write!(f, "partially_paid"),
            Self::Paid => write!(f, "paid"),
            Self::Overdue => write!(f, "overdue"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A generated bill as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub connection_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub reading_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub rate_id: String,
    #[serde(default)]
    pub consumption: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: BillStatus,
}

/// Payload of a single "create billing record" call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBill {
    pub reading_id: String,
    pub rate_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_deserializes_backend_shape() {
        let json = r#"{
            "id": 101,
            "connection_id": 7,
            "reading_id": 55,
            "rate_id": 2,
            "consumption": "18",
            "amount": "609.00",
            "due_date": "2026-11-15",
            "status": "unpaid"
        }"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.id, "101");
        assert_eq!(bill.reading_id, "55");
        assert_eq!(bill.amount, Decimal::new(60900, 2));
        assert_eq!(bill.due_date, NaiveDate::from_ymd_opt(2026, 11, 15));
        assert_eq!(bill.status, BillStatus::Unpaid);
    }

    #[test]
    fn new_bill_serializes_ids_only() {
        let payload = NewBill {
            reading_id: "55".into(),
            rate_id: "2".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"reading_id": "55", "rate_id": "2"}));
    }
}
