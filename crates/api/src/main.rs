use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexus_api::background::stale_top_ups;
use nexus_api::config::ServerConfig;
use nexus_api::payments::nowpayments::NowPaymentsClient;
use nexus_api::payments::PaymentProvider;
use nexus_api::router::build_app_router;
use nexus_api::state::AppState;
use nexus_events::{EmailConfig, EmailDelivery, EventBus, OperatorNotifier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_api=debug,nexus_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        instant_top_up = config.instant_top_up_enabled,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = nexus_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    nexus_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    nexus_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus + operator notifications ---
    let event_bus = Arc::new(EventBus::default());

    let notifier_handle = match EmailConfig::from_env() {
        Some(email_config) => {
            let delivery =
                EmailDelivery::new(email_config).expect("Invalid SMTP notification settings");
            tokio::spawn(OperatorNotifier::run(delivery, event_bus.subscribe()))
        }
        None => {
            tracing::warn!("SMTP_HOST or NOTIFICATION_EMAIL not set, operator emails disabled");
            tokio::spawn(OperatorNotifier::run_disabled(event_bus.subscribe()))
        }
    };

    // --- Payment provider ---
    let provider = NowPaymentsClient::new(config.payments.clone())
        .expect("Failed to build payment provider client");
    let payments: Arc<dyn PaymentProvider> = Arc::new(provider);

    // --- Stale top-up monitor ---
    let stale_cancel = CancellationToken::new();
    let stale_handle = tokio::spawn(stale_top_ups::run(
        pool.clone(),
        config.stale_top_up_mins,
        stale_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        payments,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    stale_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), stale_handle).await;

    // Dropping the last sender closes the channel and ends the notifier.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(15), notifier_handle).await;
    tracing::info!("Background tasks stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
