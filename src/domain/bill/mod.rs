//! Bill aggregate

pub mod model;
pub mod repository;

pub use model::{Bill, BillStatus, NewBill};
pub use repository::{BillingApi, RemoteResult};
