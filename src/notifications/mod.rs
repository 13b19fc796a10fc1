//! Notifications module
//!
//! In-process pub/sub used to tell views that what they hold is stale.
//!
//! # Usage
//! ```ignore
//! let bus = create_event_bus();
//! let mut sub = bus.subscribe();
//! // ... run a batch through BillingService ...
//! if let Some(msg) = sub.recv().await {
//!     for view in msg.event.stale_views() { /* re-fetch */ }
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
