//! Custom tracing layer for streaming tracker lifecycle events
//!
//! Captures the events the communication tracker logs (session started,
//! message recorded, session completed or discarded) and forwards them to a
//! tokio channel, e.g. for a live dashboard.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Target prefix of the tracker's lifecycle events.
pub const TRACKER_TARGET: &str = "medlens_core::tracker";

const COMMUNICATION_ID_FIELD: &str = "communication_id";
const MESSAGE_FIELD: &str = "message";

/// Event data sent to subscribers
#[derive(Debug, Clone, serde::Serialize)]
pub struct LifecycleEvent {
    /// Event target (e.g., "medlens_core::tracker")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Session the event belongs to; absent for tracker-wide events like reset
    pub communication_id: Option<String>,
    /// Remaining structured fields, rendered as text
    pub fields: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// A tracing layer that sends tracker events to a channel
pub struct LifecycleEventLayer {
    sender: mpsc::UnboundedSender<LifecycleEvent>,
    target_prefix: String,
}

impl LifecycleEventLayer {
    /// Create a new layer forwarding events under [`TRACKER_TARGET`]
    pub fn new(sender: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        Self {
            sender,
            target_prefix: TRACKER_TARGET.to_string(),
        }
    }

    /// Forward events under a different target prefix instead
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = prefix.into();
        self
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for LifecycleEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(&self.target_prefix) {
            return;
        }

        let mut visitor = LifecycleVisitor::default();
        event.record(&mut visitor);

        let lifecycle_event = LifecycleEvent {
            target: target.to_string(),
            level: event.metadata().level().to_string(),
            message: visitor.message,
            communication_id: visitor.communication_id,
            fields: visitor.fields,
            timestamp: Utc::now(),
        };

        // Receiver may be gone; lifecycle streaming is best-effort
        let _ = self.sender.send(lifecycle_event);
    }
}

/// Splits the message and communication id off from the other event fields.
#[derive(Default)]
struct LifecycleVisitor {
    message: String,
    communication_id: Option<String>,
    fields: BTreeMap<String, String>,
}

impl LifecycleVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = value,
            COMMUNICATION_ID_FIELD => self.communication_id = Some(value),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for LifecycleVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    // `%value` fields and the message arrive here; their Debug output is the Display text.
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }
}
