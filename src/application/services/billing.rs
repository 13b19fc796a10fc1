//! Billing service: the treasurer's bill generation workflow

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::bulk_billing::BulkBillingSubmitter;
use crate::domain::{
    BatchReport, Bill, BillGenerationRequest, BillableConnection, BillingApi, DomainError,
    DomainResult, MeterReading, Rate, RemoteError,
};
use crate::notifications::{
    BillBatchCompletedEvent, BillGeneratedEvent, Event, SharedEventBus, StaleView,
};
use crate::shared::utils::{retry_with_backoff, RetryConfig};

/// Fresh copies of the views a batch invalidates
#[derive(Debug, Clone)]
pub struct BillingViews {
    pub billable: Vec<BillableConnection>,
    pub bills: Vec<Bill>,
}

/// A selection that could not be turned into a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSelection {
    pub connection_id: String,
    pub reason: String,
}

/// Requests built from a user selection, plus what was left out
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub requests: Vec<BillGenerationRequest>,
    pub skipped: Vec<SkippedSelection>,
}

/// Service for the bulk billing workflow
pub struct BillingService {
    api: Arc<dyn BillingApi>,
    submitter: BulkBillingSubmitter,
    event_bus: SharedEventBus,
    read_retry: RetryConfig,
}

impl BillingService {
    pub fn new(api: Arc<dyn BillingApi>, event_bus: SharedEventBus) -> Self {
        Self {
            submitter: BulkBillingSubmitter::new(api.clone()),
            api,
            event_bus,
            read_retry: RetryConfig::default(),
        }
    }

    pub fn with_read_retry(mut self, read_retry: RetryConfig) -> Self {
        self.read_retry = read_retry;
        self
    }

    /// Active rate, retried on transient failures
    pub async fn active_rate(&self) -> DomainResult<Rate> {
        let api = &self.api;
        let rate = retry_with_backoff(
            &self.read_retry,
            || api.active_rate(),
            RemoteError::is_transient,
            "active_rate",
        )
        .await?;
        Ok(rate)
    }

    /// Connections with an approved, not yet billed reading
    pub async fn billable_connections(&self) -> DomainResult<Vec<BillableConnection>> {
        let api = &self.api;
        let listed = retry_with_backoff(
            &self.read_retry,
            || api.list_billable_connections(),
            RemoteError::is_transient,
            "list_billable_connections",
        )
        .await?;

        let total = listed.len();
        let billable: Vec<BillableConnection> =
            listed.into_iter().filter(BillableConnection::is_billable).collect();
        if billable.len() != total {
            warn!(
                listed = total,
                billable = billable.len(),
                "Backend listed connections that are not billable; ignoring them"
            );
        }
        Ok(billable)
    }

    pub async fn bills(&self) -> DomainResult<Vec<Bill>> {
        let api = &self.api;
        let bills = retry_with_backoff(
            &self.read_retry,
            || api.list_bills(),
            RemoteError::is_transient,
            "list_bills",
        )
        .await?;
        Ok(bills)
    }

    /// Re-fetch everything a completed batch made stale.
    pub async fn refresh_views(&self) -> DomainResult<BillingViews> {
        let billable = self.billable_connections().await?;
        let bills = self.bills().await?;
        Ok(BillingViews { billable, bills })
    }

    /// One request per billable connection, all against `rate`.
    pub fn billable_requests(
        billable: &[BillableConnection],
        rate: &Rate,
    ) -> Vec<BillGenerationRequest> {
        billable
            .iter()
            .filter(|b| b.is_billable())
            .map(|b| BillGenerationRequest::new(&b.connection.id, &b.reading.id, &rate.id))
            .collect()
    }

    /// Amount the backend is expected to charge for `reading` under `rate`,
    /// `None` when it does not fit in a `Decimal`
    pub fn preview_amount(reading: &MeterReading, rate: &Rate) -> Option<Decimal> {
        rate.bill_amount(reading.consumption())
    }

    /// Build requests for the selected connections from a fresh billable
    /// listing and the active rate.
    ///
    /// Selections that are unknown or no longer billable are reported in
    /// `skipped` instead of failing the whole preparation. Duplicate
    /// selections are collapsed.
    pub async fn prepare_batch(&self, connection_ids: &[String]) -> DomainResult<PreparedBatch> {
        let rate = self.active_rate().await?;
        let billable = self.billable_connections().await?;
        Ok(Self::select(&billable, &rate, connection_ids))
    }

    /// Requests for every currently billable connection
    pub async fn prepare_all(&self) -> DomainResult<PreparedBatch> {
        let rate = self.active_rate().await?;
        let billable = self.billable_connections().await?;
        Ok(PreparedBatch {
            requests: Self::billable_requests(&billable, &rate),
            skipped: Vec::new(),
        })
    }

    fn select(
        billable: &[BillableConnection],
        rate: &Rate,
        connection_ids: &[String],
    ) -> PreparedBatch {
        let by_connection: HashMap<&str, &BillableConnection> = billable
            .iter()
            .map(|b| (b.connection.id.as_str(), b))
            .collect();

        let mut requests: Vec<BillGenerationRequest> = Vec::new();
        let mut skipped = Vec::new();

        for id in connection_ids {
            if requests.iter().any(|r| &r.connection_id == id) {
                continue;
            }
            match by_connection.get(id.as_str()) {
                Some(b) => requests.push(BillGenerationRequest::new(
                    &b.connection.id,
                    &b.reading.id,
                    &rate.id,
                )),
                None => skipped.push(SkippedSelection {
                    connection_id: id.clone(),
                    reason: "no approved unbilled reading".to_string(),
                }),
            }
        }

        PreparedBatch { requests, skipped }
    }

    /// Submit a batch and announce that billing views are stale.
    ///
    /// An empty batch is rejected up front. Per-item failures never make
    /// this return `Err`; inspect the report instead.
    pub async fn generate_bills(
        &self,
        requests: &[BillGenerationRequest],
    ) -> DomainResult<BatchReport> {
        if requests.is_empty() {
            return Err(DomainError::EmptyBatch);
        }

        info!(count = requests.len(), "Generating bills");
        let report = self.submitter.submit_batch(requests).await;

        for outcome in &report.outcomes {
            if let Some(bill) = outcome.bill() {
                self.event_bus.publish(Event::BillGenerated(BillGeneratedEvent {
                    batch_id: report.batch_id,
                    bill_id: bill.id.clone(),
                    connection_id: outcome.connection_id.clone(),
                    reading_id: outcome.reading_id.clone(),
                    timestamp: Utc::now(),
                }));
            }
        }

        self.event_bus
            .publish(Event::BillBatchCompleted(BillBatchCompletedEvent {
                batch_id: report.batch_id,
                total: report.len(),
                succeeded: report.success_count(),
                failed: report.fail_count(),
                stale_views: vec![StaleView::BillableConnections, StaleView::Bills],
                timestamp: Utc::now(),
            }));

        if report.all_failed() {
            warn!(batch_id = %report.batch_id, "{}", report.summary());
        } else {
            info!(batch_id = %report.batch_id, "{}", report.summary());
        }

        Ok(report)
    }

    /// Resubmit the retryable failures of a previous batch.
    ///
    /// Only failures whose kind may succeed on a second attempt (network,
    /// server, unknown) are considered, and each one is checked against a
    /// fresh billable listing first: a timed-out call may have created the
    /// bill anyway, in which case the reading is no longer billable and is
    /// left out. Successful items of `previous` are never resubmitted.
    ///
    /// Returns `Ok(None)` when nothing is left to retry.
    pub async fn retry_failed(&self, previous: &BatchReport) -> DomainResult<Option<BatchReport>> {
        let candidates: Vec<(&str, &str)> = previous
            .failures()
            .filter(|(_, o)| o.error().is_some_and(|e| e.kind.is_retryable()))
            .map(|(_, o)| (o.connection_id.as_str(), o.reading_id.as_str()))
            .collect();

        if candidates.is_empty() {
            info!(batch_id = %previous.batch_id, "No retryable failures");
            return Ok(None);
        }

        let rate = self.active_rate().await?;
        let billable = self.billable_connections().await?;

        let still_billable: Vec<BillGenerationRequest> = candidates
            .into_iter()
            .filter(|(connection_id, reading_id)| {
                billable
                    .iter()
                    .any(|b| b.reading.id == *reading_id && b.connection.id == *connection_id)
            })
            .map(|(connection_id, reading_id)| {
                BillGenerationRequest::new(connection_id, reading_id, &rate.id)
            })
            .collect();

        if still_billable.is_empty() {
            info!(
                batch_id = %previous.batch_id,
                "Retryable failures are no longer billable; nothing to resubmit"
            );
            return Ok(None);
        }

        info!(
            batch_id = %previous.batch_id,
            count = still_billable.len(),
            "Retrying failed bill requests"
        );
        self.generate_bills(&still_billable).await.map(Some)
    }
}
