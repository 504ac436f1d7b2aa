//! HTTP-level integration tests for crypto top-ups: invoice creation and
//! provider callback reconciliation.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    admin_json, amount, balance_of, body_json, body_text, create_payment, finished_ipn, get_auth,
    post_json, post_json_auth, post_webhook, register_and_login, MockProvider, IPN_SECRET,
};
use nexus_core::order_id::generate_top_up_order_id;
use nexus_db::repositories::TopUpRepo;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Create payment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_payment_records_pending_request(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_and_login(&app, "olive@example.com").await;

    let response = post_json(
        app,
        "/api/payments/create-payment",
        json!({ "amount": 150, "email": "Olive@Example.com", "currency": "BTC" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let order_id = json["orderId"].as_str().unwrap();
    assert!(order_id.starts_with("TU-"));
    assert_eq!(json["address"], "TXyzMockDepositAddress");
    assert_eq!(json["currency"], "btc");

    let request = TopUpRepo::find_by_order_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(request.status, "pending");
    assert_eq!(request.email, "olive@example.com");
    assert_eq!(request.amount, Decimal::from(150));
    assert_eq!(request.provider_payment_id.as_deref(), Some("5077125051"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_payment_enforces_minimum_and_email(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_and_login(&app, "paul@example.com").await;

    let response = post_json(
        app.clone(),
        "/api/payments/create-payment",
        json!({ "amount": 99, "email": "paul@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Minimum top-up is 100");

    let response =
        post_json(app.clone(), "/api/payments/create-payment", json!({ "amount": 100 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "User email required");

    let response = post_json(
        app,
        "/api/payments/create-payment",
        json!({ "amount": 100, "email": "nobody@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn provider_failure_is_502_and_leaves_request_pending(pool: PgPool) {
    let provider = Arc::new(MockProvider::failing());
    let app = common::build_test_app_with(pool.clone(), common::test_config(), provider.clone());
    register_and_login(&app, "quinn@example.com").await;

    let response = post_json(
        app,
        "/api/payments/create-payment",
        json!({ "amount": 100, "email": "quinn@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(provider.calls(), 1);

    let requests = TopUpRepo::list_for_email(&pool, "quinn@example.com").await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, "pending");
}

// ---------------------------------------------------------------------------
// Webhook authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn webhook_with_bad_or_missing_signature_changes_nothing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = register_and_login(&app, "rita@example.com").await;
    let order_id = create_payment(&app, "rita@example.com", 100).await;
    let body = finished_ipn(&order_id, 100);

    let response = post_webhook(app.clone(), &body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_webhook(app.clone(), &body, Some("some-other-secret")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(balance_of(&app, &token).await, Decimal::ZERO);
    let request = TopUpRepo::find_by_order_id(&pool, &order_id).await.unwrap().unwrap();
    assert_eq!(request.status, "pending");
}

// ---------------------------------------------------------------------------
// Webhook reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_webhook_credits_exactly_once(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "sam@example.com").await;
    let order_id = create_payment(&app, "sam@example.com", 120).await;
    let body = finished_ipn(&order_id, 120);

    for _ in 0..2 {
        let response = post_webhook(app.clone(), &body, Some(IPN_SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    assert_eq!(balance_of(&app, &token).await, Decimal::from(120));
    let rows = body_json(get_auth(app, "/wallet/transactions", &token).await).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["reference"], order_id.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_final_status_is_acknowledged_without_credit(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "tara@example.com").await;
    let order_id = create_payment(&app, "tara@example.com", 100).await;

    for status in ["waiting", "confirming", "partially_paid", "failed"] {
        let mut body = finished_ipn(&order_id, 100);
        body["payment_status"] = json!(status);
        let response = post_webhook(app.clone(), &body, Some(IPN_SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(balance_of(&app, &token).await, Decimal::ZERO);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_order_is_acknowledged(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response =
        post_webhook(app.clone(), &finished_ipn(&generate_top_up_order_id(), 100), Some(IPN_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_webhook(app, &finished_ipn("someone-elses-id", 100), Some(IPN_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recorded_amount_is_credited_when_report_differs(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = register_and_login(&app, "uma@example.com").await;
    let order_id = create_payment(&app, "uma@example.com", 100).await;

    let response = post_webhook(app.clone(), &finished_ipn(&order_id, 5000), Some(IPN_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(balance_of(&app, &token).await, Decimal::from(100));
    let request = TopUpRepo::find_by_order_id(&pool, &order_id).await.unwrap().unwrap();
    assert_eq!(request.status, "completed");
    assert_eq!(request.reported_amount, Some(Decimal::from(5000)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_reported_amount_still_credits_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = register_and_login(&app, "uri@example.com").await;
    let order_id = create_payment(&app, "uri@example.com", 100).await;

    for price_amount in [json!(100_000_000_000_000_000u64), json!(1e40)] {
        let mut body = finished_ipn(&order_id, 100);
        body["price_amount"] = price_amount;
        let response = post_webhook(app.clone(), &body, Some(IPN_SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let mut body = finished_ipn(&order_id, 100);
    body["price_amount"] = json!(100_000_000_000_000_000u64);
    let response = post_webhook(app.clone(), &body, Some(IPN_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(balance_of(&app, &token).await, Decimal::from(100));
    let request = TopUpRepo::find_by_order_id(&pool, &order_id).await.unwrap().unwrap();
    assert_eq!(request.status, "completed");
    assert_eq!(request.reported_amount, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn webhook_for_deleted_owner_is_404_and_stays_pending(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_and_login(&app, "vic@example.com").await;
    let order_id = create_payment(&app, "vic@example.com", 100).await;

    let response = admin_json(
        app.clone(),
        Method::DELETE,
        "/admin/delete",
        json!({ "email": "vic@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_webhook(app, &finished_ipn(&order_id, 100), Some(IPN_SECRET)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "User not found");

    let request = TopUpRepo::find_by_order_id(&pool, &order_id).await.unwrap().unwrap();
    assert_eq!(request.status, "pending");
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn top_up_then_purchase_scenario(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "wade@example.com").await;

    let response = admin_json(
        app.clone(),
        Method::POST,
        "/admin/catalog",
        json!({ "slug": "prime-video", "name": "Prime Video account", "price": 100 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item_id = body_json(response).await["id"].as_i64().unwrap();

    let order_id = create_payment(&app, "wade@example.com", 100).await;
    for _ in 0..2 {
        let response = post_webhook(app.clone(), &finished_ipn(&order_id, 100), Some(IPN_SECRET)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(balance_of(&app, &token).await, Decimal::from(100));

    let response =
        post_json_auth(app.clone(), "/wallet/purchase", &token, json!({ "itemId": item_id })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(amount(&json["balance"]), Decimal::ZERO);
    assert_eq!(json["order"]["status"], "delivered");

    let top_ups = body_json(get_auth(app.clone(), "/wallet/topups", &token).await).await;
    assert_eq!(top_ups[0]["status"], "completed");

    let response =
        post_json_auth(app.clone(), "/wallet/purchase", &token, json!({ "itemId": item_id })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(balance_of(&app, &token).await, Decimal::ZERO);
}
