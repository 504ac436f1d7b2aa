//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`StoreEvent`]s. It is
//! shared via `Arc<EventBus>` in the API state. Publishing never blocks and
//! never fails the caller.

use chrono::{DateTime, Utc};
use nexus_core::types::{Amount, DbId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

/// A new account was registered.
pub const USER_REGISTERED: &str = "user.registered";

/// A balance was credited (admin, instant, or reconciled crypto top-up).
pub const WALLET_TOPPED_UP: &str = "wallet.topped_up";

/// A catalog item was purchased from the wallet balance.
pub const ORDER_PURCHASED: &str = "order.purchased";

/// A finished payment referenced a request whose owner no longer exists.
pub const TOP_UP_UNMATCHED_OWNER: &str = "topup.unmatched_owner";

// ---------------------------------------------------------------------------
// StoreEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Dot-separated event name, e.g. `"wallet.topped_up"`.
    pub event_type: String,

    /// Account email the event concerns.
    pub email: String,

    /// Optional id of the affected user.
    pub user_id: Option<DbId>,

    /// Event-specific data (amounts, references).
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl StoreEvent {
    pub fn new(event_type: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            email: email.into(),
            user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn user_registered(user_id: DbId, email: &str) -> Self {
        Self::new(USER_REGISTERED, email).with_user(user_id)
    }

    /// `source` is a human-readable credit description such as "Crypto top-up".
    pub fn wallet_topped_up(user_id: DbId, email: &str, amount: Amount, source: &str) -> Self {
        Self::new(WALLET_TOPPED_UP, email)
            .with_user(user_id)
            .with_payload(serde_json::json!({ "amount": amount, "source": source }))
    }

    pub fn order_purchased(user_id: DbId, email: &str, amount: Amount, reference: &str) -> Self {
        Self::new(ORDER_PURCHASED, email)
            .with_user(user_id)
            .with_payload(serde_json::json!({ "amount": amount, "reference": reference }))
    }

    pub fn top_up_unmatched_owner(email: &str, order_id: &str, amount: Amount) -> Self {
        Self::new(TOP_UP_UNMATCHED_OWNER, email)
            .with_payload(serde_json::json!({ "orderId": order_id, "amount": amount }))
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: StoreEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Amount {
        Amount::from(value)
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(StoreEvent::wallet_topped_up(7, "a@shop.io", dec(150), "Crypto top-up"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, WALLET_TOPPED_UP);
        assert_eq!(received.email, "a@shop.io");
        assert_eq!(received.user_id, Some(7));
        assert_eq!(received.payload["amount"], "150");
        assert_eq!(received.payload["source"], "Crypto top-up");
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(StoreEvent::user_registered(1, "new@shop.io"));

        assert_eq!(rx1.recv().await.unwrap().event_type, USER_REGISTERED);
        assert_eq!(rx2.recv().await.unwrap().event_type, USER_REGISTERED);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(StoreEvent::new("orphan.event", "x@shop.io"));
    }

    #[test]
    fn unmatched_owner_event_has_no_user() {
        let event = StoreEvent::top_up_unmatched_owner("gone@shop.io", "TU-1", dec(100));
        assert!(event.user_id.is_none());
        assert_eq!(event.payload["orderId"], "TU-1");
    }
}
