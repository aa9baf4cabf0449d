//! Dashboard event bus
//!
//! Client flows (reconciliation, the payment drawer) announce what happened
//! through an explicit [`EventBus`] instead of a process-wide toast/dispatch
//! mechanism. Views subscribe and decide how to render.
//!
//! ```text
//! Drawer ────────┐
//!                ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ invoice list view
//! Reconciler ────┘                                              ──▶ toast area
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DashboardEvent::InvoiceRefreshed { invoice_id });
//!
//! if let Ok(envelope) = rx.recv().await {
//!     println!("{:?}", envelope.event);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Something the rest of the dashboard may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Fresh invoice, payment and audit data was loaded
    InvoiceRefreshed { invoice_id: Uuid },

    /// The embedded payment form reported success
    PaymentCompleted { invoice_id: Uuid },

    /// A manual payment was recorded
    PaymentRecorded { invoice_id: Uuid, amount: f64 },

    /// The invoice email was dispatched
    InvoiceSent { invoice_id: Uuid },

    /// Short user-facing notification
    Toast { level: ToastLevel, message: String },
}

impl DashboardEvent {
    pub fn toast_error(message: impl Into<String>) -> Self {
        DashboardEvent::Toast {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn toast_success(message: impl Into<String>) -> Self {
        DashboardEvent::Toast {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn toast_info(message: impl Into<String>) -> Self {
        DashboardEvent::Toast {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    /// Invoice this event relates to, if any
    pub fn invoice_id(&self) -> Option<Uuid> {
        match self {
            DashboardEvent::InvoiceRefreshed { invoice_id }
            | DashboardEvent::PaymentCompleted { invoice_id }
            | DashboardEvent::PaymentRecorded { invoice_id, .. }
            | DashboardEvent::InvoiceSent { invoice_id } => Some(*invoice_id),
            DashboardEvent::Toast { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DashboardEvent::InvoiceRefreshed { .. } => "invoice_refreshed",
            DashboardEvent::PaymentCompleted { .. } => "payment_completed",
            DashboardEvent::PaymentRecorded { .. } => "payment_recorded",
            DashboardEvent::InvoiceSent { .. } => "invoice_sent",
            DashboardEvent::Toast { .. } => "toast",
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: DashboardEvent,
}

impl EventEnvelope {
    pub fn new(event: DashboardEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: DashboardEvent) -> usize {
        tracing::debug!(kind = event.kind(), "dashboard event");
        // send() only errs when nobody listens
        self.sender.send(EventEnvelope::new(event)).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let invoice_id = Uuid::new_v4();
        let json = serde_json::to_value(DashboardEvent::PaymentCompleted { invoice_id }).unwrap();
        assert_eq!(json["kind"], "payment_completed");
        assert_eq!(json["invoice_id"], invoice_id.to_string());

        let json = serde_json::to_value(DashboardEvent::toast_error("nope")).unwrap();
        assert_eq!(json["kind"], "toast");
        assert_eq!(json["level"], "error");
    }

    #[test]
    fn test_invoice_id_accessor() {
        let invoice_id = Uuid::new_v4();
        assert_eq!(
            DashboardEvent::InvoiceRefreshed { invoice_id }.invoice_id(),
            Some(invoice_id)
        );
        assert_eq!(DashboardEvent::toast_success("ok").invoice_id(), None);
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let invoice_id = Uuid::new_v4();

        assert_eq!(bus.publish(DashboardEvent::InvoiceSent { invoice_id }), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event, DashboardEvent::InvoiceSent { invoice_id });
        assert!(received.timestamp <= Utc::now());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(DashboardEvent::toast_success("saved")), 0);
    }

    #[test]
    fn test_clones_share_channel() {
        let bus = EventBus::default();
        let _rx = bus.subscribe();
        let other = bus.clone();
        assert_eq!(other.receiver_count(), 1);
    }
}
