//! Registry change events for asynchronous observers
//!
//! Synchronous consumers subscribe to the registry's observables. Consumers
//! living on an async runtime (a websocket pushing filter state, an audit
//! log) use the [`EventBus`] instead; it is built on `tokio::sync::broadcast`
//! and never blocks the registry.
//!
//! # Architecture
//!
//! ```text
//! set_filter ────┐
//! remove_filter ─┤
//! clear_filters ─┼──▶ EventBus::publish() ──▶ broadcast channel ──▶ async receivers
//! set_sort_by ───┤
//! destroy ───────┘
//! ```

use crate::core::query::SortBy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events describing registry mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FiltersEvent {
    /// A filter was created or replaced
    FilterSet {
        registry: String,
        filter_id: String,
        replaced: bool,
    },
    /// A filter was removed
    FilterRemoved { registry: String, filter_id: String },
    /// All filters were removed
    FiltersCleared { registry: String, count: usize },
    /// The sort specification changed
    SortChanged {
        registry: String,
        sort: Option<SortBy>,
    },
    /// The registry was torn down
    Destroyed { registry: String },
}

impl FiltersEvent {
    /// Name of the registry that produced the event
    pub fn registry(&self) -> &str {
        match self {
            FiltersEvent::FilterSet { registry, .. }
            | FiltersEvent::FilterRemoved { registry, .. }
            | FiltersEvent::FiltersCleared { registry, .. }
            | FiltersEvent::SortChanged { registry, .. }
            | FiltersEvent::Destroyed { registry } => registry,
        }
    }

    /// Get the filter ID this event relates to (if applicable)
    pub fn filter_id(&self) -> Option<&str> {
        match self {
            FiltersEvent::FilterSet { filter_id, .. }
            | FiltersEvent::FilterRemoved { filter_id, .. } => Some(filter_id),
            _ => None,
        }
    }

    /// Get the action name
    pub fn action(&self) -> &str {
        match self {
            FiltersEvent::FilterSet { .. } => "filter_set",
            FiltersEvent::FilterRemoved { .. } => "filter_removed",
            FiltersEvent::FiltersCleared { .. } => "filters_cleared",
            FiltersEvent::SortChanged { .. } => "sort_changed",
            FiltersEvent::Destroyed { .. } => "destroyed",
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: FiltersEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: FiltersEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Non-blocking. Returns the number of receivers that will get the event;
    /// with no receivers the event is dropped.
    pub fn publish(&self, event: FiltersEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
