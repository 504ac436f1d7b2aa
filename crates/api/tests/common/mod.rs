#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use nexus_api::auth::jwt::JwtConfig;
use nexus_api::config::ServerConfig;
use nexus_api::middleware::rbac::ADMIN_SECRET_HEADER;
use nexus_api::payments::nowpayments::NowPaymentsConfig;
use nexus_api::payments::{Invoice, InvoiceRequest, PaymentProvider, ProviderError};
use nexus_api::router::build_app_router;
use nexus_api::state::AppState;
use nexus_core::ipn::{sign_body, SIGNATURE_HEADER};
use nexus_events::EventBus;

pub const ADMIN_SECRET: &str = "test-admin-secret";
pub const IPN_SECRET: &str = "test-ipn-secret";
pub const PASSWORD: &str = "correct-horse";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 60,
        },
        admin_secret: ADMIN_SECRET.to_string(),
        instant_top_up_enabled: false,
        stale_top_up_mins: 1440,
        min_top_up_amount: Decimal::from(100),
        payments: NowPaymentsConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-api-key".to_string(),
            ipn_secret: IPN_SECRET.to_string(),
            public_base_url: "http://localhost:5000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            default_pay_currency: "usdttrc20".to_string(),
            timeout_secs: 5,
        },
    }
}

// ---------------------------------------------------------------------------
// Payment provider double
// ---------------------------------------------------------------------------

/// In-process provider that answers with a fixed deposit address, or fails
/// every call when built with [`MockProvider::failing`].
#[derive(Default)]
pub struct MockProvider {
    fail: bool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::HttpStatus {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(Invoice {
            provider_payment_id: Some("5077125051".into()),
            pay_address: "TXyzMockDepositAddress".into(),
            pay_currency: request.pay_currency.clone(),
            pay_amount: Some(request.price_amount),
            invoice_url: None,
        })
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), Arc::new(MockProvider::default()))
}

pub fn build_test_app_with(
    pool: PgPool,
    config: ServerConfig,
    payments: Arc<dyn PaymentProvider>,
) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        payments,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should be handled")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, &body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), &body)).await
}

/// Send a JSON request authenticated with the `x-admin-secret` header.
pub async fn admin_json(app: Router, method: Method, uri: &str, body: Value) -> Response<Body> {
    let mut request = json_request(method, uri, None, &body);
    request
        .headers_mut()
        .insert(ADMIN_SECRET_HEADER, ADMIN_SECRET.parse().unwrap());
    send(app, request).await
}

/// Deliver a provider callback signed with `secret`.
pub async fn post_webhook(app: Router, body: &Value, secret: Option<&str>) -> Response<Body> {
    let raw = body.to_string();
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SIGNATURE_HEADER, sign_body(secret.as_bytes(), raw.as_bytes()));
    }
    send(app, builder.body(Body::from(raw)).unwrap()).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Parse a money field serialized as a decimal string.
pub fn amount(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("amount should be a string")).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario helpers
// ---------------------------------------------------------------------------

/// Register an account through the API and return a session token.
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let credentials = serde_json::json!({ "email": email, "password": PASSWORD });

    let response = post_json(app.clone(), "/auth/register", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(app.clone(), "/auth/login", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .expect("login should return a token")
        .to_string()
}

/// Start a crypto top-up and return its order id.
pub async fn create_payment(app: &Router, email: &str, amount: u32) -> String {
    let response = post_json(
        app.clone(),
        "/api/payments/create-payment",
        serde_json::json!({ "amount": amount, "email": email }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["orderId"]
        .as_str()
        .expect("create-payment should return an orderId")
        .to_string()
}

pub fn finished_ipn(order_id: &str, price_amount: u32) -> Value {
    serde_json::json!({
        "payment_id": 5077125051u64,
        "payment_status": "finished",
        "order_id": order_id,
        "price_amount": price_amount,
        "price_currency": "usd",
        "pay_amount": 100.5,
        "actually_paid": 100.5,
        "pay_currency": "usdttrc20",
    })
}

pub async fn balance_of(app: &Router, token: &str) -> Decimal {
    let response = get_auth(app.clone(), "/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    amount(&body_json(response).await["balance"])
}
