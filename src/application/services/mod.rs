//! Application services

mod billing;
mod bulk_billing;

pub use billing::{BillingService, BillingViews, PreparedBatch, SkippedSelection};
pub use bulk_billing::BulkBillingSubmitter;
