//! Bulk bill generation request/outcome types

use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::bill::{Bill, NewBill};
use crate::shared::errors::RemoteError;

/// One entry of a bulk generation batch.
///
/// Built transiently from a selected connection/reading pair. The reading
/// is expected to be approved and not yet billed; that is checked when the
/// batch is assembled, not when it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct BillGenerationRequest {
    /// Connection the reading belongs to, echoed back in the outcome
    #[validate(custom(function = "not_blank"))]
    pub connection_id: String,
    #[validate(custom(function = "not_blank"))]
    pub reading_id: String,
    #[validate(custom(function = "not_blank"))]
    pub rate_id: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

impl BillGenerationRequest {
    pub fn new(
        connection_id: impl Into<String>,
        reading_id: impl Into<String>,
        rate_id: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            reading_id: reading_id.into(),
            rate_id: rate_id.into(),
        }
    }

    pub fn to_new_bill(&self) -> NewBill {
        NewBill {
            reading_id: self.reading_id.clone(),
            rate_id: self.rate_id.clone(),
        }
    }
}

/// What happened to one request of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BillGenerationOutcome {
    pub connection_id: String,
    pub reading_id: String,
    pub result: Result<Bill, RemoteError>,
}

impl BillGenerationOutcome {
    pub fn succeeded(request: &BillGenerationRequest, bill: Bill) -> Self {
        Self {
            connection_id: request.connection_id.clone(),
            reading_id: request.reading_id.clone(),
            result: Ok(bill),
        }
    }

    pub fn failed(request: &BillGenerationRequest, error: RemoteError) -> Self {
        Self {
            connection_id: request.connection_id.clone(),
            reading_id: request.reading_id.clone(),
            result: Err(error),
        }
    }

    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn bill(&self) -> Option<&Bill> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&RemoteError> {
        self.result.as_ref().err()
    }
}

/// Outcomes of a whole batch, index-aligned with the submitted requests
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub outcomes: Vec<BillGenerationOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<BillGenerationOutcome>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            outcomes,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success()).count()
    }

    pub fn fail_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Failed outcomes together with their position in the batch
    pub fn failures(&self) -> impl Iterator<Item = (usize, &BillGenerationOutcome)> {
        self.outcomes.iter().enumerate().filter(|(_, o)| !o.success())
    }

    pub fn bills(&self) -> impl Iterator<Item = &Bill> {
        self.outcomes.iter().filter_map(|o| o.bill())
    }

    /// Non-empty batch where nothing went through
    pub fn all_failed(&self) -> bool {
        !self.is_empty() && self.success_count() == 0
    }

    /// Like [`all_failed`](Self::all_failed), but a bill generated by the
    /// retry round of this batch counts as well.
    pub fn all_failed_with_retry(&self, retry: Option<&BatchReport>) -> bool {
        self.all_failed() && retry.map_or(true, |r| r.success_count() == 0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} bills generated ({} succeeded, {} failed)",
            self.success_count(),
            self.len(),
            self.success_count(),
            self.fail_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::bill::BillStatus;

    fn bill(id: &str) -> Bill {
        Bill {
            id: id.into(),
            connection_id: "c".into(),
            reading_id: "r".into(),
            rate_id: "1".into(),
            consumption: Decimal::ZERO,
            amount: Decimal::new(100, 0),
            due_date: None,
            status: BillStatus::Unpaid,
        }
    }

    #[test]
    fn request_validation_rejects_empty_reading() {
        assert!(BillGenerationRequest::new("c1", "r1", "1").validate().is_ok());
        let errors = BillGenerationRequest::new("c1", "", "1").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reading_id"));
    }

    #[test]
    fn request_validation_rejects_blank_ids() {
        let errors = BillGenerationRequest::new(" ", "r1", "\t").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("connection_id"));
        assert!(fields.contains_key("rate_id"));
        assert!(!fields.contains_key("reading_id"));
    }

    #[test]
    fn retry_round_decides_overall_failure() {
        let req = BillGenerationRequest::new("c1", "r1", "1");
        let partial = BatchReport::new(vec![
            BillGenerationOutcome::succeeded(&req, bill("b1")),
            BillGenerationOutcome::succeeded(&req, bill("b2")),
            BillGenerationOutcome::failed(&req, RemoteError::server("boom")),
        ]);
        let retry_failed_again = BatchReport::new(vec![BillGenerationOutcome::failed(
            &req,
            RemoteError::server("boom"),
        )]);
        // two bills went through in the first round
        assert!(!partial.all_failed_with_retry(Some(&retry_failed_again)));

        let nothing = BatchReport::new(vec![BillGenerationOutcome::failed(
            &req,
            RemoteError::network("timed out"),
        )]);
        assert!(nothing.all_failed_with_retry(None));
        assert!(nothing.all_failed_with_retry(Some(&retry_failed_again)));

        let retry_ok = BatchReport::new(vec![BillGenerationOutcome::succeeded(&req, bill("b3"))]);
        assert!(!nothing.all_failed_with_retry(Some(&retry_ok)));
    }

    #[test]
    fn report_counts_and_failures() {
        let req = BillGenerationRequest::new("c1", "r1", "1");
        let report = BatchReport::new(vec![
            BillGenerationOutcome::succeeded(&req, bill("b1")),
            BillGenerationOutcome::failed(&req, RemoteError::server("boom")),
            BillGenerationOutcome::succeeded(&req, bill("b2")),
        ]);

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.fail_count(), 1);
        assert_eq!(report.failures().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.bills().count(), 2);
        assert!(!report.all_failed());
        assert_eq!(report.summary(), "2 of 3 bills generated (2 succeeded, 1 failed)");
    }

    #[test]
    fn empty_report_is_not_all_failed() {
        let report = BatchReport::new(Vec::new());
        assert!(report.is_empty());
        assert!(!report.all_failed());
        assert_eq!(report.fail_count(), 0);
    }
}
