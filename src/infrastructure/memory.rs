//! In-memory billing backend for development and testing
//!
//! Behaves like the REST backend for the calls the treasurer module makes:
//! bills are priced with the active rate, readings flip to billed, and a
//! second attempt on a billed reading is a conflict. Failures can be
//! injected per reading.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Days, Utc};
use dashmap::DashMap;

use crate::domain::{
    Bill, BillStatus, BillableConnection, BillingApi, NewBill, Rate, RemoteError, RemoteResult,
};

/// Days between bill generation and due date
const DUE_IN_DAYS: u64 = 15;

pub struct InMemoryBillingApi {
    rate: Rate,
    /// Keyed by reading id
    readings: DashMap<String, BillableConnection>,
    bills: DashMap<u64, Bill>,
    failures: DashMap<String, RemoteError>,
    bill_counter: AtomicU64,
}

impl InMemoryBillingApi {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            readings: DashMap::new(),
            bills: DashMap::new(),
            failures: DashMap::new(),
            bill_counter: AtomicU64::new(1),
        }
    }

    pub fn add_billable(&self, entry: BillableConnection) {
        self.readings.insert(entry.reading.id.clone(), entry);
    }

    /// Make every `create_bill` for `reading_id` fail with `error`.
    pub fn fail_reading(&self, reading_id: &str, error: RemoteError) {
        self.failures.insert(reading_id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Flag a reading as billed without creating a bill here, as if another
    /// session had billed it.
    pub fn mark_billed(&self, reading_id: &str) {
        if let Some(mut entry) = self.readings.get_mut(reading_id) {
            entry.reading.is_billed = true;
        }
    }

    pub fn bills_for_reading(&self, reading_id: &str) -> usize {
        self.bills
            .iter()
            .filter(|b| b.value().reading_id == reading_id)
            .count()
    }
}

#[async_trait]
impl BillingApi for InMemoryBillingApi {
    async fn create_bill(&self, new_bill: &NewBill) -> RemoteResult<Bill> {
        if let Some(err) = self.failures.get(&new_bill.reading_id) {
            return Err(err.clone());
        }

        let rate = &self.rate;
        if !rate.is_active || rate.id != new_bill.rate_id {
            return Err(RemoteError::validation("invalid rate").with_status(422));
        }

        let mut entry = self.readings.get_mut(&new_bill.reading_id).ok_or_else(|| {
            RemoteError::validation(format!("reading {} not found", new_bill.reading_id))
                .with_status(400)
        })?;

        if entry.reading.is_billed {
            return Err(RemoteError::conflict(format!(
                "duplicate reading: {} is already billed",
                new_bill.reading_id
            ))
            .with_status(409));
        }
        if !entry.reading.is_billable() {
            return Err(RemoteError::validation(format!(
                "reading {} is {}, not approved",
                new_bill.reading_id, entry.reading.status
            ))
            .with_status(422));
        }

        let consumption = entry.reading.consumption();
        let amount = rate.bill_amount(consumption).ok_or_else(|| {
            RemoteError::validation(format!(
                "amount for reading {} is out of range",
                new_bill.reading_id
            ))
            .with_status(422)
        })?;

        let id = self.bill_counter.fetch_add(1, Ordering::SeqCst);
        let bill = Bill {
            id: id.to_string(),
            connection_id: entry.connection.id.clone(),
            reading_id: entry.reading.id.clone(),
            rate_id: rate.id.clone(),
            consumption,
            amount,
            due_date: Utc::now()
                .date_naive()
                .checked_add_days(Days::new(DUE_IN_DAYS)),
            status: BillStatus::Unpaid,
        };

        entry.reading.is_billed = true;
        drop(entry);
        self.bills.insert(id, bill.clone());

        Ok(bill)
    }

    async fn list_billable_connections(&self) -> RemoteResult<Vec<BillableConnection>> {
        let mut list: Vec<BillableConnection> = self
            .readings
            .iter()
            .filter(|e| e.value().reading.is_billable())
            .map(|e| e.value().clone())
            .collect();
        list.sort_by(|a, b| a.connection.id.cmp(&b.connection.id));
        Ok(list)
    }

    async fn list_bills(&self) -> RemoteResult<Vec<Bill>> {
        let mut list: Vec<(u64, Bill)> = self
            .bills
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        list.sort_by_key(|(id, _)| *id);
        Ok(list.into_iter().map(|(_, bill)| bill).collect())
    }

    async fn active_rate(&self) -> RemoteResult<Rate> {
        if !self.rate.is_active {
            return Err(RemoteError::validation("no active rate").with_status(404));
        }
        Ok(self.rate.clone())
    }
}
