//! Store event bus and operator notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StoreEvent`]: the domain event envelope published by request handlers.
//! - [`OperatorNotifier`]: background service that turns events into
//!   operator emails, best-effort and off the request path.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{EventBus, StoreEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use notifier::OperatorNotifier;
