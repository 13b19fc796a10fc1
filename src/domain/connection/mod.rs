pub mod model;

pub use model::{BillableConnection, Connection};
