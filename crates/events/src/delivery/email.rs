//! Operator notification emails via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport and sends one
//! plain-text email per [`StoreEvent`] to the configured operator address.
//! If `SMTP_HOST` or `NOTIFICATION_EMAIL` is unset, [`EmailConfig::from_env`]
//! returns `None` and notifications are disabled.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::bus::{self, StoreEvent};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Nexus <noreply@nexus.local>";

/// Configuration for operator email delivery.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Operator inbox that receives every notification.
    pub notification_address: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable             | Required | Default                        |
    /// |----------------------|----------|--------------------------------|
    /// | `SMTP_HOST`          | yes      |                                |
    /// | `NOTIFICATION_EMAIL` | yes      |                                |
    /// | `SMTP_PORT`          | no       | `587`                          |
    /// | `SMTP_FROM`          | no       | `Nexus <noreply@nexus.local>`  |
    /// | `SMTP_USER`          | no       |                                |
    /// | `SMTP_PASSWORD`      | no       |                                |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let notification_address = std::env::var("NOTIFICATION_EMAIL").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            notification_address,
        })
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Subject and plain-text body for an operator notification.
pub fn render(event: &StoreEvent) -> (String, String) {
    let time = event.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
    let amount = event.payload["amount"].as_str().unwrap_or("-");

    match event.event_type.as_str() {
        bus::USER_REGISTERED => (
            "New User Registration".to_string(),
            format!("New user registered\nEmail: {}\nTime: {time}", event.email),
        ),
        bus::WALLET_TOPPED_UP => (
            "User Top-Up Alert".to_string(),
            format!(
                "User account topped up\nEmail: {}\nAmount added: {amount}\nSource: {}\nTime: {time}",
                event.email,
                event.payload["source"].as_str().unwrap_or("-"),
            ),
        ),
        bus::ORDER_PURCHASED => (
            "Purchase Detected".to_string(),
            format!(
                "User made a purchase\nEmail: {}\nAmount spent: {amount}\nReference: {}\nTime: {time}",
                event.email,
                event.payload["reference"].as_str().unwrap_or("-"),
            ),
        ),
        bus::TOP_UP_UNMATCHED_OWNER => (
            "Unmatched Top-Up Payment".to_string(),
            format!(
                "A finished payment could not be credited: no account for its email.\n\
                 Email: {}\nOrder: {}\nAmount: {amount}\nTime: {time}\n\
                 The request remains pending.",
                event.email,
                event.payload["orderId"].as_str().unwrap_or("-"),
            ),
        ),
        other => (
            format!("[Nexus] {other}"),
            format!(
                "Event: {other}\nEmail: {}\nTime: {time}\nDetails: {}",
                event.email,
                serde_json::to_string_pretty(&event.payload).unwrap_or_default()
            ),
        ),
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends operator notification emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Build the SMTP transport. No connection is opened until the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            config,
        })
    }

    /// Send the notification for `event` to the operator inbox.
    pub async fn deliver(&self, event: &StoreEvent) -> Result<(), EmailError> {
        let (subject, body) = render(event);

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.config.notification_address.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer.send(email).await?;

        tracing::info!(event_type = %event.event_type, email = %event.email, "Operator email sent");
        Ok(())
    }
}
