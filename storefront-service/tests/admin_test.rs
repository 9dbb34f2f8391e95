mod common;

use axum::http::StatusCode;
use common::{checkout_body, TestApp};
use serde_json::json;
use storefront_service::{
    dtos::order::CheckoutRequest,
    models::{ConfirmationSource, Message, PaymentProvider},
    services::PaymentConfirmation,
};

fn product_body() -> serde_json::Value {
    json!({
        "name": "Acupressure Mat",
        "description": "Spiked mat for back relief",
        "price": 1299,
        "category": "Health Therapy",
        "countInStock": 12,
        "image": "https://cdn.example.com/mat.jpg",
        "shippingType": "cod",
        "shippingCharge": 60
    })
}

#[tokio::test]
async fn admin_routes_reject_customers_and_anonymous_callers() {
    let app = TestApp::new();
    let (_, token) = app.create_user("Asha", "asha@example.com").await;

    for uri in ["/api/admin/products", "/api/admin/orders", "/api/admin/users", "/api/admin/messages"] {
        assert_eq!(app.get(uri, None).await.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(app.get(uri, Some(&token)).await.status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn product_lifecycle() {
    let app = TestApp::new();
    let (_, token) = app.create_admin("Owner", "admin@example.com").await;

    let created = app.post("/api/admin/products", Some(&token), product_body()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["shippingType"], "cod");
    assert_eq!(created.body["shippingCharge"], 60.0);
    let id = created.body["_id"].as_str().unwrap().to_string();

    let listed = app.get("/api/admin/products", Some(&token)).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let updated = app
        .put(
            &format!("/api/admin/products/{}", id),
            Some(&token),
            json!({"price": 999, "countInStock": 3}),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["price"], 999.0);
    assert_eq!(updated.body["countInStock"], 3);
    assert_eq!(updated.body["name"], "Acupressure Mat");

    let public = app.get(&format!("/api/products/{}", id), None).await;
    assert_eq!(public.body["price"], 999.0);

    let deleted = app.delete(&format!("/api/admin/products/{}", id), Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Product removed");

    let gone = app.delete(&format!("/api/admin/products/{}", id), Some(&token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_validation_errors_are_unprocessable() {
    let app = TestApp::new();
    let (_, token) = app.create_admin("Owner", "admin@example.com").await;
    let mut body = product_body();
    body["name"] = json!("");
    body["price"] = json!(-5);

    let response = app.post("/api/admin/products", Some(&token), body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.store.products.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn order_management() {
    let app = TestApp::new();
    let (customer, _) = app.create_user("Asha", "asha@example.com").await;
    let (_, token) = app.create_admin("Owner", "admin@example.com").await;
    let product = app.create_product("Therapy Mat", 2499.0, 10).await;

    let mut ids = Vec::new();
    for qty in 1..=3 {
        let req: CheckoutRequest =
            serde_json::from_value(checkout_body(&[(product.id.as_str(), qty)])).unwrap();
        let order = app
            .state
            .checkout
            .place_order(&customer, req, PaymentProvider::Phonepe)
            .await
            .unwrap();
        ids.push(order.id);
    }

    let page = app.get("/api/admin/orders?page=1&limit=2", Some(&token)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(page.body["meta"], json!({"total": 3, "page": 1, "pages": 2}));

    let page = app.get("/api/admin/orders?page=2&limit=2", Some(&token)).await;
    assert_eq!(page.body["data"].as_array().unwrap().len(), 1);

    let beyond = app
        .get("/api/admin/orders?page=18446744073709551615", Some(&token))
        .await;
    assert_eq!(beyond.status, StatusCode::OK);
    assert!(beyond.body["data"].as_array().unwrap().is_empty());
    assert_eq!(beyond.body["meta"]["total"], 3);

    let shipped = app
        .put(
            &format!("/api/admin/orders/{}/status", ids[0]),
            Some(&token),
            json!({"status": "Shipped"}),
        )
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.body["status"], "Shipped");
    assert_eq!(shipped.body["isPaid"], false);

    for status in ["Paid", "Payment_Failed"] {
        let refused = app
            .put(
                &format!("/api/admin/orders/{}/status", ids[2]),
                Some(&token),
                json!({ "status": status }),
            )
            .await;
        assert_eq!(refused.status, StatusCode::BAD_REQUEST, "{}", status);
    }
    let untouched = app.store.orders.find_by_id(&ids[2]).await.unwrap().unwrap();
    assert_eq!(untouched.status.as_str(), "Processing");
    assert!(!untouched.is_paid);

    let detail = app.get(&format!("/api/admin/orders/{}", ids[0]), Some(&token)).await;
    assert_eq!(detail.body["status"], "Shipped");
    assert_eq!(detail.body["isDelivered"], false);

    let delivered = app
        .put(
            &format!("/api/admin/orders/{}/status", ids[0]),
            Some(&token),
            json!({"status": "Delivered"}),
        )
        .await;
    assert_eq!(delivered.body["isDelivered"], true);
    assert!(delivered.body["deliveredAt"].is_string());

    let deleted = app.delete(&format!("/api/admin/orders/{}", ids[1]), Some(&token)).await;
    assert_eq!(deleted.body["message"], "Order removed");
    assert!(app.store.orders.find_by_id(&ids[1]).await.unwrap().is_none());

    let missing = app
        .put(
            "/api/admin/orders/nope/status",
            Some(&token),
            json!({"status": "Delivered"}),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn paid_order_cannot_be_marked_failed_by_admin() {
    let app = TestApp::new();
    let (customer, _) = app.create_user("Asha", "asha@example.com").await;
    let (_, token) = app.create_admin("Owner", "admin@example.com").await;
    let product = app.create_product("Therapy Mat", 2499.0, 10).await;
    let req: CheckoutRequest =
        serde_json::from_value(checkout_body(&[(product.id.as_str(), 1)])).unwrap();
    let order = app
        .state
        .checkout
        .place_order(&customer, req, PaymentProvider::Razorpay)
        .await
        .unwrap();
    app.state
        .reconciler
        .confirm(
            &order.id,
            PaymentConfirmation {
                provider: PaymentProvider::Razorpay,
                provider_order_id: Some("order_rzp_9".to_string()),
                payment_id: Some("pay_9".to_string()),
                signature: None,
                amount_minor: Some(order.total_minor_units()),
                source: ConfirmationSource::Webhook,
            },
        )
        .await
        .unwrap();

    let response = app
        .put(
            &format!("/api/admin/orders/{}/status", order.id),
            Some(&token),
            json!({"status": "Payment_Failed"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let stored = app.store.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert!(stored.is_paid);
    assert_eq!(stored.status.as_str(), "Paid");
}

#[tokio::test]
async fn user_management() {
    let app = TestApp::new();
    let (admin, token) = app.create_admin("Owner", "admin@example.com").await;
    let (customer, _) = app.create_user("Asha", "asha@example.com").await;

    let users = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(users.status, StatusCode::OK);
    let users = users.body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let promoted = app
        .put(
            &format!("/api/admin/users/{}/role", customer.id),
            Some(&token),
            json!({"isAdmin": true}),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["isAdmin"], true);

    let self_revoke = app
        .put(
            &format!("/api/admin/users/{}/role", admin.id),
            Some(&token),
            json!({"isAdmin": false}),
        )
        .await;
    assert_eq!(self_revoke.status, StatusCode::BAD_REQUEST);
    assert_eq!(self_revoke.body["error"], "You cannot remove your own admin role");

    let self_delete = app
        .delete(&format!("/api/admin/users/{}", admin.id), Some(&token))
        .await;
    assert_eq!(self_delete.status, StatusCode::BAD_REQUEST);
    assert_eq!(self_delete.body["error"], "You cannot delete your own account");

    let removed = app
        .delete(&format!("/api/admin/users/{}", customer.id), Some(&token))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["message"], "User removed");
    assert!(app.store.users.find_by_id(&customer.id).await.unwrap().is_none());
}

#[tokio::test]
async fn message_inbox() {
    let app = TestApp::new();
    let (_, token) = app.create_admin("Owner", "admin@example.com").await;
    let first = Message::new(
        "Ravi".to_string(),
        "ravi@example.com".to_string(),
        "Do you ship to Pune?".to_string(),
    );
    app.store.messages.insert(&first).await.unwrap();
    app.store
        .messages
        .insert(&Message::new(
            "Meera".to_string(),
            "meera@example.com".to_string(),
            "Is the oil organic?".to_string(),
        ))
        .await
        .unwrap();

    let listed = app.get("/api/admin/messages", Some(&token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 2);

    let count = app.get("/api/admin/messages/count", Some(&token)).await;
    assert_eq!(count.body["count"], 2);

    let deleted = app
        .delete(&format!("/api/admin/messages/{}", first.id), Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["success"], true);

    let count = app.get("/api/admin/messages/count", Some(&token)).await;
    assert_eq!(count.body["count"], 1);

    let again = app
        .delete(&format!("/api/admin/messages/{}", first.id), Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
