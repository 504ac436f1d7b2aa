use std::sync::Arc;

use crate::config::ServerConfig;
use crate::payments::PaymentProvider;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: nexus_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for operator notifications.
    pub event_bus: Arc<nexus_events::EventBus>,
    /// External invoice provider.
    pub payments: Arc<dyn PaymentProvider>,
}
