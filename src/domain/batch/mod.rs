pub mod model;

pub use model::{BatchReport, BillGenerationOutcome, BillGenerationRequest};
