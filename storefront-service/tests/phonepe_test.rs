mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{checkout_body, ProviderUrls, TestApp, PHONEPE_MERCHANT_ID, PHONEPE_SALT_KEY};
use serde_json::json;
use service_core::utils::signature::sha256_hex;
use storefront_service::{
    dtos::order::CheckoutRequest,
    models::{Order, PaymentProvider, User},
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn x_verify(payload: &str) -> String {
    format!(
        "{}###1",
        sha256_hex(format!("{}{}", payload, PHONEPE_SALT_KEY).as_bytes())
    )
}

fn transaction(order_id: &str, code: &str, state: &str, amount: i64) -> serde_json::Value {
    let success = code == "PAYMENT_SUCCESS";
    json!({
        "success": success,
        "code": code,
        "message": "status",
        "data": {
            "merchantId": PHONEPE_MERCHANT_ID,
            "merchantTransactionId": order_id,
            "transactionId": "T2401011234",
            "amount": amount,
            "state": state,
            "responseCode": "SUCCESS"
        }
    })
}

async fn send_callback(app: &TestApp, payload: &serde_json::Value) -> common::TestResponse {
    let response = STANDARD.encode(payload.to_string());
    let checksum = x_verify(&response);
    app.post_raw(
        "/api/orders/phonepe/callback",
        &json!({ "response": response }).to_string(),
        &[("X-VERIFY", checksum.as_str())],
    )
    .await
}

async fn pending_order(app: &TestApp, user: &User, product_id: &str, qty: u32) -> Order {
    let req: CheckoutRequest = serde_json::from_value(checkout_body(&[(product_id, qty)])).unwrap();
    app.state
        .checkout
        .place_order(user, req, PaymentProvider::Phonepe)
        .await
        .unwrap()
}

async fn reload(app: &TestApp, order_id: &str) -> Order {
    app.store.orders.find_by_id(order_id).await.unwrap().unwrap()
}

#[tokio::test]
async fn create_sends_signed_pay_request_and_returns_redirect() {
    let phonepe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pg/v1/pay"))
        .and(header_exists("X-VERIFY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "code": "PAYMENT_INITIATED",
            "data": {"instrumentResponse": {"redirectInfo": {"url": "https://mercury.phonepe.test/pay/abc"}}}
        })))
        .expect(1)
        .mount(&phonepe)
        .await;

    let app = TestApp::with_providers(ProviderUrls {
        phonepe: phonepe.uri(),
        ..ProviderUrls::default()
    });
    let (_, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;

    let response = app
        .post(
            "/api/orders/phonepe/create",
            Some(&token),
            checkout_body(&[(product.id.as_str(), 2)]),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["redirectUrl"], "https://mercury.phonepe.test/pay/abc");

    let order_id = response.body["orderId"].as_str().unwrap();
    let order = reload(&app, order_id).await;
    assert_eq!(order.total_price, 1798.0);
    assert_eq!(order.provider_order_id(), Some(order_id));

    // The pay payload carries the server-side amount in paise
    let requests = phonepe.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let encoded = body["request"].as_str().unwrap();
    let payload: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
    assert_eq!(payload["amount"], 179800);
    assert_eq!(payload["merchantTransactionId"], order_id);
    assert_eq!(payload["paymentInstrument"]["type"], "PAY_PAGE");
}

#[tokio::test]
async fn create_failure_is_bad_gateway_and_order_stays_unpaid() {
    let phonepe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pg/v1/pay"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false, "code": "BAD_REQUEST", "message": "Invalid amount"
        })))
        .mount(&phonepe)
        .await;

    let app = TestApp::with_providers(ProviderUrls {
        phonepe: phonepe.uri(),
        ..ProviderUrls::default()
    });
    let (user, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;

    let response = app
        .post(
            "/api/orders/phonepe/create",
            Some(&token),
            checkout_body(&[(product.id.as_str(), 1)]),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    let orders = app.store.orders.list_for_user(&user.id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert!(!orders[0].is_paid);
}

#[tokio::test]
async fn success_callback_marks_paid_once() {
    let app = TestApp::new();
    let (user, _) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;
    let payload = transaction(&order.id, "PAYMENT_SUCCESS", "COMPLETED", 89900);

    let first = send_callback(&app, &payload).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, json!({"success": true}));

    let paid = reload(&app, &order.id).await;
    assert!(paid.is_paid);
    assert_eq!(
        paid.payment_result.as_ref().and_then(|r| r.payment_id.as_deref()),
        Some("T2401011234")
    );

    let replay = send_callback(&app, &payload).await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(reload(&app, &order.id).await.paid_at, paid.paid_at);

    let stock = app
        .store
        .products
        .find_by_id(&product.id)
        .await
        .unwrap()
        .unwrap()
        .count_in_stock;
    assert_eq!(stock, 4);
}

#[tokio::test]
async fn callback_with_wrong_checksum_is_rejected() {
    let app = TestApp::new();
    let (user, _) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;
    let response = STANDARD.encode(
        transaction(&order.id, "PAYMENT_SUCCESS", "COMPLETED", 89900).to_string(),
    );

    let result = app
        .post_raw(
            "/api/orders/phonepe/callback",
            &json!({ "response": response }).to_string(),
            &[("X-VERIFY", "0000###1")],
        )
        .await;

    assert_eq!(result.status, StatusCode::BAD_REQUEST);
    assert_eq!(result.body["error"], "Invalid signature");
    assert!(!reload(&app, &order.id).await.is_paid);
}

#[tokio::test]
async fn callback_amount_mismatch_is_not_applied() {
    let app = TestApp::new();
    let (user, _) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;

    let response = send_callback(
        &app,
        &transaction(&order.id, "PAYMENT_SUCCESS", "COMPLETED", 100),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(!reload(&app, &order.id).await.is_paid);
}

#[tokio::test]
async fn declined_callback_marks_payment_failed() {
    let app = TestApp::new();
    let (user, _) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;

    let response = send_callback(
        &app,
        &transaction(&order.id, "PAYMENT_DECLINED", "FAILED", 89900),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let stored = reload(&app, &order.id).await;
    assert!(!stored.is_paid);
    assert_eq!(stored.status.as_str(), "Payment_Failed");
}

#[tokio::test]
async fn status_poll_applies_success_and_converges_with_callback() {
    let phonepe = MockServer::start().await;
    let app = TestApp::with_providers(ProviderUrls {
        phonepe: phonepe.uri(),
        ..ProviderUrls::default()
    });
    let (user, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;

    let status_path = format!("/pg/v1/status/{}/{}", PHONEPE_MERCHANT_ID, order.id);
    Mock::given(method("GET"))
        .and(path(status_path.clone()))
        .and(header("X-MERCHANT-ID", PHONEPE_MERCHANT_ID))
        .and(header("X-VERIFY", x_verify(&status_path).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction(
            &order.id,
            "PAYMENT_SUCCESS",
            "COMPLETED",
            89900,
        )))
        .expect(1)
        .mount(&phonepe)
        .await;

    let polled = app
        .get(
            &format!("/api/orders/phonepe/status/{}", order.id),
            Some(&token),
        )
        .await;
    assert_eq!(polled.status, StatusCode::OK);
    assert_eq!(polled.body["success"], true);
    assert_eq!(polled.body["code"], "PAYMENT_SUCCESS");
    assert_eq!(polled.body["order"]["isPaid"], true);

    // The late callback finds the order already paid
    let callback = send_callback(
        &app,
        &transaction(&order.id, "PAYMENT_SUCCESS", "COMPLETED", 89900),
    )
    .await;
    assert_eq!(callback.status, StatusCode::OK);

    // Paid orders answer without calling PhonePe again
    let again = app
        .get(
            &format!("/api/orders/phonepe/status/{}", order.id),
            Some(&token),
        )
        .await;
    assert_eq!(again.body["code"], "PAYMENT_SUCCESS");
    assert_eq!(again.body["order"]["paidAt"], polled.body["order"]["paidAt"]);
}

#[tokio::test]
async fn status_poll_leaves_pending_orders_unpaid() {
    let phonepe = MockServer::start().await;
    let app = TestApp::with_providers(ProviderUrls {
        phonepe: phonepe.uri(),
        ..ProviderUrls::default()
    });
    let (user, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &user, &product.id, 1).await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/pg/v1/status/{}/{}",
            PHONEPE_MERCHANT_ID, order.id
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction(
            &order.id,
            "PAYMENT_PENDING",
            "PENDING",
            89900,
        )))
        .mount(&phonepe)
        .await;

    let polled = app
        .get(
            &format!("/api/orders/phonepe/status/{}", order.id),
            Some(&token),
        )
        .await;

    assert_eq!(polled.status, StatusCode::OK);
    assert_eq!(polled.body["success"], false);
    assert_eq!(polled.body["code"], "PAYMENT_PENDING");
    assert_eq!(polled.body["order"]["isPaid"], false);
    assert_eq!(polled.body["order"]["status"], "Processing");
}

#[tokio::test]
async fn status_poll_is_owner_only() {
    let app = TestApp::new();
    let (owner, _) = app.create_user("Asha", "asha@example.com").await;
    let (_, intruder) = app.create_user("Ravi", "ravi@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let order = pending_order(&app, &owner, &product.id, 1).await;

    let response = app
        .get(
            &format!("/api/orders/phonepe/status/{}", order.id),
            Some(&intruder),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_poll_rejects_orders_from_other_providers() {
    let phonepe = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&phonepe)
        .await;

    let app = TestApp::with_providers(ProviderUrls {
        phonepe: phonepe.uri(),
        ..ProviderUrls::default()
    });
    let (user, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app.create_product("Massage Roller", 899.0, 5).await;
    let req: CheckoutRequest =
        serde_json::from_value(checkout_body(&[(product.id.as_str(), 1)])).unwrap();
    let order = app
        .state
        .checkout
        .place_order(&user, req, PaymentProvider::Razorpay)
        .await
        .unwrap();

    let response = app
        .get(
            &format!("/api/orders/phonepe/status/{}", order.id),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Order was not placed with PhonePe");
}
