//! # Aquabill treasurer
//!
//! Treasurer-side client for a water utility's REST billing backend: lists
//! connections with approved, unbilled meter readings and generates their
//! bills in bulk, keeping per-connection success/failure accounting.
//!
//! ## Architecture
//!
//! - **domain**: readings, rates, bills, batch request/outcome types and the
//!   `BillingApi` port
//! - **application**: the bulk billing submitter and the billing workflow
//!   service built on it
//! - **infrastructure**: `BillingApi` adapters (HTTP and in-memory)
//! - **notifications**: in-process events telling views they are stale
//! - **shared**: error types and the retry helper

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{BillingService, BulkBillingSubmitter};
pub use infrastructure::{HttpBillingApi, InMemoryBillingApi};
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
pub use shared::errors::{AppError, ConfigError, DomainError, RemoteError, RemoteErrorKind};
