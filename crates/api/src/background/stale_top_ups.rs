//! Periodic report of pending top-ups that never received a callback.
//!
//! Pending requests are never expired automatically. This job only makes
//! them visible; operators inspect them with `GET /admin/topups` and settle
//! them with the force-complete endpoint.

use std::time::Duration;

use chrono::Utc;
use nexus_core::top_up::created_cutoff;
use nexus_db::repositories::TopUpRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the check runs.
const CHECK_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the stale top-up report loop until `cancel` is triggered.
pub async fn run(pool: PgPool, stale_after_mins: i64, cancel: CancellationToken) {
    tracing::info!(
        stale_after_mins,
        interval_secs = CHECK_INTERVAL.as_secs(),
        "Stale top-up monitor started"
    );

    let mut interval = tokio::time::interval(CHECK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale top-up monitor stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = match created_cutoff(Utc::now(), stale_after_mins) {
                    Ok(cutoff) => cutoff,
                    Err(e) => {
                        tracing::error!(error = %e, stale_after_mins, "Invalid stale threshold");
                        continue;
                    }
                };
                match TopUpRepo::count_pending_before(&pool, cutoff).await {
                    Ok(0) => tracing::debug!("No stale pending top-ups"),
                    Ok(stale) => tracing::warn!(
                        stale,
                        stale_after_mins,
                        "Pending top-ups without a payment callback"
                    ),
                    Err(e) => tracing::error!(error = %e, "Stale top-up check failed"),
                }
            }
        }
    }
}
