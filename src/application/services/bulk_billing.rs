//! Bulk bill generation with per-item failure accounting

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::domain::{
    BatchReport, BillGenerationOutcome, BillGenerationRequest, BillingApi, RemoteError,
};

/// Submits a batch of independent bill generation requests, one remote call
/// per request, strictly in order.
///
/// A failing request never aborts or taints its siblings: the failure is
/// recorded in that request's outcome and the loop moves on. The returned
/// report is index-aligned with the input, so `report.outcomes[i]` always
/// describes `requests[i]`.
///
/// Nothing is retried here. `create_bill` is not idempotent on the backend,
/// so resubmitting is left to the caller (see `BillingService::retry_failed`).
pub struct BulkBillingSubmitter {
    api: Arc<dyn BillingApi>,
}

impl BulkBillingSubmitter {
    pub fn new(api: Arc<dyn BillingApi>) -> Self {
        Self { api }
    }

    pub async fn submit_batch(&self, requests: &[BillGenerationRequest]) -> BatchReport {
        self.submit_batch_with_progress(requests, |_, _| {}).await
    }

    /// Same as [`submit_batch`](Self::submit_batch), calling `on_progress`
    /// with `(index, outcome)` right after each request completes.
    pub async fn submit_batch_with_progress<F>(
        &self,
        requests: &[BillGenerationRequest],
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(usize, &BillGenerationOutcome) + Send,
    {
        let mut outcomes = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let outcome = self.submit_one(index, request).await;
            on_progress(index, &outcome);
            outcomes.push(outcome);
        }

        let report = BatchReport::new(outcomes);

        metrics::counter!("bill_batches_total").increment(1);
        info!(
            batch_id = %report.batch_id,
            total = report.len(),
            succeeded = report.success_count(),
            failed = report.fail_count(),
            "Bill batch finished"
        );

        report
    }

    async fn submit_one(&self, index: usize, request: &BillGenerationRequest) -> BillGenerationOutcome {
        // Malformed entries are recorded in place so positions stay aligned.
        if let Err(errors) = request.validate() {
            warn!(
                index,
                connection_id = %request.connection_id,
                error = %errors,
                "Skipping malformed bill request"
            );
            record_outcome(false);
            return BillGenerationOutcome::failed(request, RemoteError::validation(errors.to_string()));
        }

        match self.api.create_bill(&request.to_new_bill()).await {
            Ok(bill) => {
                debug!(
                    index,
                    connection_id = %request.connection_id,
                    reading_id = %request.reading_id,
                    bill_id = %bill.id,
                    amount = %bill.amount,
                    "Bill created"
                );
                record_outcome(true);
                BillGenerationOutcome::succeeded(request, bill)
            }
            Err(err) => {
                warn!(
                    index,
                    connection_id = %request.connection_id,
                    reading_id = %request.reading_id,
                    kind = %err.kind,
                    error = %err.message,
                    "Bill creation failed"
                );
                record_outcome(false);
                BillGenerationOutcome::failed(request, err)
            }
        }
    }
}

fn record_outcome(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("bills_generated_total", "outcome" => outcome).increment(1);
}
