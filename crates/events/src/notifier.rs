//! Best-effort operator notification service.
//!
//! [`OperatorNotifier`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and emails each event to the operator. Every send is bounded by a
//! timeout; failures are logged and never reach the request that published
//! the event.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::bus::StoreEvent;
use crate::delivery::email::{EmailDelivery, EmailError};

/// Upper bound on a single notification send.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one bounded delivery attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
    TimedOut,
}

/// Background service that forwards store events to the operator inbox.
pub struct OperatorNotifier;

impl OperatorNotifier {
    /// Run the notification loop until the bus is dropped.
    pub async fn run(delivery: EmailDelivery, mut receiver: broadcast::Receiver<StoreEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let outcome = bounded(DELIVERY_TIMEOUT, delivery.deliver(&event)).await;
                    match outcome {
                        DeliveryOutcome::Sent => {}
                        DeliveryOutcome::Failed(error) => tracing::error!(
                            error = %error,
                            event_type = %event.event_type,
                            "Failed to send operator notification"
                        ),
                        DeliveryOutcome::TimedOut => tracing::warn!(
                            event_type = %event.event_type,
                            timeout_secs = DELIVERY_TIMEOUT.as_secs(),
                            "Operator notification timed out"
                        ),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notifier lagged, some events were not emailed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notifier shutting down");
                    break;
                }
            }
        }
    }

    /// Drain the bus without sending anything. Used when email is not
    /// configured so published events are still acknowledged in the log.
    pub async fn run_disabled(mut receiver: broadcast::Receiver<StoreEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::debug!(event_type = %event.event_type, email = %event.email, "Notification skipped (email not configured)");
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Await `send` for at most `limit`.
pub async fn bounded<F>(limit: Duration, send: F) -> DeliveryOutcome
where
    F: Future<Output = Result<(), EmailError>>,
{
    match tokio::time::timeout(limit, send).await {
        Ok(Ok(())) => DeliveryOutcome::Sent,
        Ok(Err(e)) => DeliveryOutcome::Failed(e.to_string()),
        Err(_) => DeliveryOutcome::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn bounded_reports_success() {
        let outcome = bounded(DELIVERY_TIMEOUT, async { Ok(()) }).await;
        assert_eq!(outcome, DeliveryOutcome::Sent);
    }

    #[tokio::test]
    async fn bounded_reports_failure() {
        let outcome = bounded(DELIVERY_TIMEOUT, async {
            Err(EmailError::Build("bad".to_string()))
        })
        .await;
        assert_eq!(outcome, DeliveryOutcome::Failed("Email build error: bad".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_times_out_slow_send() {
        let outcome = bounded(DELIVERY_TIMEOUT, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert_eq!(outcome, DeliveryOutcome::TimedOut);
    }

    #[tokio::test]
    async fn disabled_notifier_exits_when_bus_dropped() {
        let bus = EventBus::default();
        let handle = tokio::spawn(OperatorNotifier::run_disabled(bus.subscribe()));
        bus.publish(StoreEvent::user_registered(1, "a@shop.io"));
        drop(bus);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("notifier should stop")
            .unwrap();
    }
}
