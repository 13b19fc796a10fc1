//! Infrastructure layer - external concerns

pub mod http;
pub mod memory;

pub use http::HttpBillingApi;
pub use memory::InMemoryBillingApi;
