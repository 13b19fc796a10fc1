//! Billing backend port

use async_trait::async_trait;

use super::model::{Bill, NewBill};
use crate::domain::connection::BillableConnection;
use crate::domain::rate::Rate;
use crate::shared::errors::RemoteError;

/// Result of a single call against the billing backend
pub type RemoteResult<T> = Result<T, RemoteError>;

/// The REST billing backend as seen by the treasurer module.
///
/// `create_bill` is not idempotent: the backend keeps no deduplication key,
/// so calling it twice for the same reading may produce two bills. The
/// other methods are plain reads.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn create_bill(&self, bill: &NewBill) -> RemoteResult<Bill>;
    async fn list_billable_connections(&self) -> RemoteResult<Vec<BillableConnection>>;
    async fn list_bills(&self) -> RemoteResult<Vec<Bill>>;
    async fn active_rate(&self) -> RemoteResult<Rate>;
}
