use nexus_core::money::DEFAULT_MIN_TOP_UP;
use nexus_core::top_up::{created_cutoff, DEFAULT_STALE_AFTER_MINS};
use nexus_core::types::Amount;

use crate::auth::jwt::JwtConfig;
use crate::payments::nowpayments::NowPaymentsConfig;

/// Server configuration loaded from environment variables.
///
/// Optional settings have defaults suitable for local development. Secrets
/// have no defaults and the server refuses to start without them.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Shared secret accepted in `x-admin-secret` and exchanged for admin sessions.
    pub admin_secret: String,
    /// Whether `POST /wallet/topup` may credit balance without a payment.
    pub instant_top_up_enabled: bool,
    /// Age after which a pending top-up is reported as stale.
    pub stale_top_up_mins: i64,
    /// Smallest provider-backed top-up accepted.
    pub min_top_up_amount: Amount,
    /// Payment provider settings.
    pub payments: NowPaymentsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `5000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `ADMIN_SECRET`           | required                |
    /// | `INSTANT_TOP_UP_ENABLED` | `false`                 |
    /// | `STALE_TOP_UP_MINS`      | `1440`                  |
    /// | `MIN_TOP_UP_AMOUNT`      | `100`                   |
    ///
    /// JWT and payment provider variables are documented on
    /// [`JwtConfig::from_env`] and [`NowPaymentsConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let admin_secret =
            std::env::var("ADMIN_SECRET").expect("ADMIN_SECRET must be set in the environment");
        assert!(!admin_secret.is_empty(), "ADMIN_SECRET must not be empty");

        let instant_top_up_enabled = std::env::var("INSTANT_TOP_UP_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let stale_top_up_mins: i64 = std::env::var("STALE_TOP_UP_MINS")
            .unwrap_or_else(|_| DEFAULT_STALE_AFTER_MINS.to_string())
            .parse()
            .expect("STALE_TOP_UP_MINS must be a valid i64");
        if let Err(e) = created_cutoff(chrono::Utc::now(), stale_top_up_mins) {
            panic!("STALE_TOP_UP_MINS is invalid: {e}");
        }

        let min_top_up_amount: Amount = std::env::var("MIN_TOP_UP_AMOUNT")
            .unwrap_or_else(|_| DEFAULT_MIN_TOP_UP.to_string())
            .parse()
            .expect("MIN_TOP_UP_AMOUNT must be a decimal number");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            admin_secret,
            instant_top_up_enabled,
            stale_top_up_mins,
            min_top_up_amount,
            payments: NowPaymentsConfig::from_env(),
        }
    }
}
