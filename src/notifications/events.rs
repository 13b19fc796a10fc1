//! Notification events
//!
//! Defines the events a billing session broadcasts to interested views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locally held views that must be re-fetched after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleView {
    BillableConnections,
    Bills,
}

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A bulk generation batch has finished (successfully or not)
    BillBatchCompleted(BillBatchCompletedEvent),
    /// A single bill was created
    BillGenerated(BillGeneratedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BillBatchCompleted(_) => "bill_batch_completed",
            Event::BillGenerated(_) => "bill_generated",
        }
    }

    /// Views a subscriber should drop after seeing this event
    pub fn stale_views(&self) -> &[StaleView] {
        match self {
            Event::BillBatchCompleted(e) => &e.stale_views,
            Event::BillGenerated(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillBatchCompletedEvent {
    pub batch_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub stale_views: Vec<StaleView>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillGeneratedEvent {
    pub batch_id: Uuid,
    pub bill_id: String,
    pub connection_id: String,
    pub reading_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Event envelope carrying a unique id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: Uuid,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
        }
    }
}
