//! HTTP-level integration tests for the `/wallet` resource.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{
    admin_json, amount, balance_of, body_json, get_auth, post_json_auth, register_and_login,
    MockProvider,
};
use nexus_db::models::catalog::{CatalogItem, CreateCatalogItem};
use nexus_db::repositories::CatalogRepo;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_item(pool: &PgPool, slug: &str, price: i64) -> CatalogItem {
    CatalogRepo::create(
        pool,
        &CreateCatalogItem {
            slug: slug.to_string(),
            name: format!("Account {slug}"),
            price: Decimal::from(price),
        },
    )
    .await
    .expect("catalog item creation should succeed")
}

async fn admin_credit(app: &Router, email: &str, value: i64) {
    let response = admin_json(
        app.clone(),
        Method::POST,
        "/admin/topup",
        json!({ "email": email, "amount": value }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

fn instant_app(pool: PgPool) -> Router {
    let mut config = common::test_config();
    config.instant_top_up_enabled = true;
    common::build_test_app_with(pool, config, Arc::new(MockProvider::default()))
}

// ---------------------------------------------------------------------------
// Instant top-up
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn instant_top_up_is_refused_when_disabled(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "gina@example.com").await;

    let response = post_json_auth(app.clone(), "/wallet/topup", &token, json!({ "amount": 50 })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(balance_of(&app, &token).await, Decimal::ZERO);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn instant_top_up_credits_and_records_deposit(pool: PgPool) {
    let app = instant_app(pool);
    let token = register_and_login(&app, "hank@example.com").await;

    let response = post_json_auth(app.clone(), "/wallet/topup", &token, json!({ "amount": "25.50" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(amount(&body_json(response).await["balance"]), Decimal::new(2550, 2));

    let response = get_auth(app, "/wallet/transactions", &token).await;
    let rows = body_json(response).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["type"], "deposit");
    assert_eq!(rows[0]["description"], "Instant top-up");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn instant_top_up_validates_amount(pool: PgPool) {
    let app = instant_app(pool);
    let token = register_and_login(&app, "ivy@example.com").await;

    for body in [json!({}), json!({ "amount": 0 }), json!({ "amount": -10 })] {
        let response = post_json_auth(app.clone(), "/wallet/topup", &token, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(balance_of(&app, &token).await, Decimal::ZERO);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn money_fields_are_decimal_strings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "iris@example.com").await;
    let response = admin_json(
        app.clone(),
        Method::POST,
        "/admin/topup",
        json!({ "email": "iris@example.com", "amount": "10.10" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let credited = body_json(response).await;
    assert!(credited["balance"].is_string(), "balance should be a string: {credited}");

    let me = body_json(get_auth(app.clone(), "/me", &token).await).await;
    assert!(me["balance"].is_string());
    assert_eq!(amount(&me["balance"]), Decimal::new(1010, 2));

    let rows = body_json(get_auth(app, "/wallet/transactions", &token).await).await;
    assert!(rows[0]["amount"].is_string());
    assert_eq!(amount(&rows[0]["amount"]), Decimal::new(1010, 2));
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_debits_balance_and_records_order(pool: PgPool) {
    let item = create_item(&pool, "steam-a", 40).await;
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "jack@example.com").await;
    admin_credit(&app, "jack@example.com", 100).await;

    let response =
        post_json_auth(app.clone(), "/wallet/purchase", &token, json!({ "itemId": item.id })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(amount(&json["balance"]), Decimal::from(60));
    assert_eq!(json["order"]["status"], "delivered");
    assert_eq!(json["order"]["accountName"], "Account steam-a");

    let orders = body_json(get_auth(app.clone(), "/wallet/orders", &token).await).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let rows = body_json(get_auth(app, "/wallet/transactions", &token).await).await;
    assert_eq!(rows[0]["type"], "purchase");
    assert_eq!(amount(&rows[0]["amount"]), Decimal::from(-40));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_beyond_balance_is_refused_without_side_effects(pool: PgPool) {
    let item = create_item(&pool, "netflix", 100).await;
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "kate@example.com").await;
    admin_credit(&app, "kate@example.com", 60).await;

    let response =
        post_json_auth(app.clone(), "/wallet/purchase", &token, json!({ "itemId": item.id })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_FUNDS");

    assert_eq!(balance_of(&app, &token).await, Decimal::from(60));
    let orders = body_json(get_auth(app, "/wallet/orders", &token).await).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_purchase_fails_once_balance_is_spent(pool: PgPool) {
    let item = create_item(&pool, "spotify", 70).await;
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "liam@example.com").await;
    admin_credit(&app, "liam@example.com", 100).await;

    let body = json!({ "itemId": item.id });
    let (first, second) = tokio::join!(
        post_json_auth(app.clone(), "/wallet/purchase", &token, body.clone()),
        post_json_auth(app.clone(), "/wallet/purchase", &token, body.clone()),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    assert_eq!(balance_of(&app, &token).await, Decimal::from(30));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_of_unknown_item_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "mia@example.com").await;

    let response = post_json_auth(app, "/wallet/purchase", &token, json!({ "itemId": 999_999 })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Frozen accounts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn frozen_account_cannot_use_wallet(pool: PgPool) {
    let item = create_item(&pool, "hulu", 10).await;
    let app = common::build_test_app(pool);
    let token = register_and_login(&app, "noah@example.com").await;
    admin_credit(&app, "noah@example.com", 50).await;

    let response = admin_json(
        app.clone(),
        Method::POST,
        "/admin/freeze",
        json!({ "email": "noah@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        post_json_auth(app.clone(), "/wallet/purchase", &token, json!({ "itemId": item.id })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Account frozen");

    let response = get_auth(app.clone(), "/me", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Login still works and reports the flag.
    let body = json!({ "email": "noah@example.com", "password": common::PASSWORD });
    let response = common::post_json(app.clone(), "/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["frozen"], true);

    let response = admin_json(
        app.clone(),
        Method::POST,
        "/admin/unfreeze",
        json!({ "email": "noah@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(balance_of(&app, &token).await, Decimal::from(50));
}
