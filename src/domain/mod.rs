pub mod batch;
pub mod bill;
pub mod connection;
pub mod ids;
pub mod rate;
pub mod reading;

// Re-export commonly used types
pub use batch::{BatchReport, BillGenerationOutcome, BillGenerationRequest};
pub use bill::{Bill, BillStatus, BillingApi, NewBill, RemoteResult};
pub use connection::{BillableConnection, Connection};
pub use rate::{AmountBreakdown, Rate};
pub use reading::{MeterReading, ReadingStatus};

pub use crate::shared::errors::{DomainError, RemoteError, RemoteErrorKind};

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
