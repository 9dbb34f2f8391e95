mod common;

use axum::http::StatusCode;
use common::{checkout_body, TestApp};
use storefront_service::{
    dtos::order::CheckoutRequest,
    models::{Order, PaymentProvider, User},
};

async fn place(app: &TestApp, user: &User, product_id: &str, qty: u32) -> Order {
    let req: CheckoutRequest = serde_json::from_value(checkout_body(&[(product_id, qty)])).unwrap();
    app.state
        .checkout
        .place_order(user, req, PaymentProvider::Razorpay)
        .await
        .unwrap()
}

#[tokio::test]
async fn my_orders_lists_only_the_callers_orders() {
    let app = TestApp::new();
    let (asha, asha_token) = app.create_user("Asha", "asha@example.com").await;
    let (ravi, ravi_token) = app.create_user("Ravi", "ravi@example.com").await;
    let product = app.create_product("Therapy Mat", 2499.0, 10).await;

    place(&app, &asha, &product.id, 1).await;
    place(&app, &asha, &product.id, 2).await;
    let ravis = place(&app, &ravi, &product.id, 1).await;

    let response = app.get("/api/orders/myorders", Some(&asha_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let orders = response.body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["user"] == asha.id.as_str()));

    let response = app.get("/api/orders/myorders", Some(&ravi_token)).await;
    let orders = response.body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["_id"], ravis.id.as_str());
}

#[tokio::test]
async fn my_orders_requires_login() {
    let app = TestApp::new();
    let response = app.get("/api/orders/myorders", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn order_detail_carries_server_side_totals() {
    let app = TestApp::new();
    let (asha, token) = app.create_user("Asha", "asha@example.com").await;
    let product = app
        .create_product_with_shipping(
            "Herbal Massage Oil",
            499.0,
            25,
            storefront_service::models::ShippingType::Cod,
            40.0,
        )
        .await;
    let order = place(&app, &asha, &product.id, 2).await;

    let response = app.get(&format!("/api/orders/{}", order.id), Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["itemsPrice"], 998.0);
    assert_eq!(response.body["shippingPrice"], 80.0);
    assert_eq!(response.body["totalPrice"], 1078.0);
    assert_eq!(response.body["isPaid"], false);
    assert_eq!(response.body["status"], "Processing");
    assert_eq!(response.body["orderItems"][0]["name"], "Herbal Massage Oil");
    assert_eq!(response.body["paymentMethod"], "razorpay");
}

#[tokio::test]
async fn order_detail_is_hidden_from_other_customers_but_not_admins() {
    let app = TestApp::new();
    let (asha, _) = app.create_user("Asha", "asha@example.com").await;
    let (_, ravi_token) = app.create_user("Ravi", "ravi@example.com").await;
    let (_, admin_token) = app.create_admin("Owner", "admin@example.com").await;
    let product = app.create_product("Therapy Mat", 2499.0, 10).await;
    let order = place(&app, &asha, &product.id, 1).await;
    let uri = format!("/api/orders/{}", order.id);

    let response = app.get(&uri, Some(&ravi_token)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get(&uri, Some(&admin_token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["_id"], order.id.as_str());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new();
    let (_, token) = app.create_user("Asha", "asha@example.com").await;

    let response = app.get("/api/orders/does-not-exist", Some(&token)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Order not found");
}
