//! HTTP adapter for the billing backend

pub mod client;
pub mod errors;

pub use client::HttpBillingApi;
pub use errors::{classify_response, classify_transport};
