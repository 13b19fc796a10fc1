//! Rate aggregate
//!
//! Contains the Rate entity and bill amount calculation.

pub mod model;

pub use model::{AmountBreakdown, Rate};
