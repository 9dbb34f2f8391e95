//! Shared setup for storefront-service integration tests.
//!
//! Every test gets an in-memory store, a recording email provider and the
//! full router, driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use storefront_service::{
    build_router,
    config::{
        EmailConfig, Environment, JwtConfig, MongoConfig, OAuthConfig, OAuthProviderConfig,
        PhonePeConfig, RateLimitConfig, RazorpayConfig, SecurityConfig, StorageBackend,
        StorageConfig, StorefrontConfig, SwaggerConfig,
    },
    models::{Product, ShippingType, User},
    services::{EmailProvider, MockEmailService, Store},
    utils::{hash_password, Password},
    AppState,
};
use tower::util::ServiceExt;

pub const TEST_PASSWORD: &str = "secret123";
pub const RAZORPAY_KEY_ID: &str = "rzp_test_key";
pub const RAZORPAY_KEY_SECRET: &str = "rzp_test_secret";
pub const RAZORPAY_WEBHOOK_SECRET: &str = "rzp_webhook_secret";
pub const PHONEPE_MERCHANT_ID: &str = "MERCHANTUAT";
pub const PHONEPE_SALT_KEY: &str = "099eb0cd-02cf-4e2a-8aca-3e6c6aff0399";
pub const ADMIN_EMAIL: &str = "owner@shop.test";

/// Base URLs for the outbound providers. Point them at a wiremock server
/// when a test exercises a provider call.
#[derive(Debug, Clone)]
pub struct ProviderUrls {
    pub razorpay: String,
    pub phonepe: String,
    pub oauth: String,
}

impl Default for ProviderUrls {
    fn default() -> Self {
        // Nothing listens on port 9; calls fail fast.
        let unreachable = "http://127.0.0.1:9".to_string();
        Self {
            razorpay: unreachable.clone(),
            phonepe: unreachable.clone(),
            oauth: unreachable,
        }
    }
}

pub fn test_config(urls: &ProviderUrls) -> StorefrontConfig {
    let oauth_provider = |name: &str| OAuthProviderConfig {
        client_id: format!("{}-client-id", name),
        client_secret: Secret::new(format!("{}-client-secret", name)),
        redirect_uri: format!("http://localhost:5000/api/auth/{}/callback", name),
        authorize_url: format!("{}/{}/authorize", urls.oauth, name),
        token_url: format!("{}/{}/token", urls.oauth, name),
        userinfo_url: format!("{}/{}/userinfo", urls.oauth, name),
    };

    StorefrontConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "storefront-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            mongodb: MongoConfig {
                uri: Secret::new("mongodb://localhost:27017".to_string()),
                database: "storefront_test".to_string(),
            },
        },
        jwt: JwtConfig {
            secret: Secret::new("integration-test-jwt-secret-0123456789".to_string()),
            expiry_days: 30,
        },
        oauth: OAuthConfig {
            frontend_url: "http://localhost:5173".to_string(),
            google: Some(oauth_provider("google")),
            facebook: None,
        },
        razorpay: RazorpayConfig {
            key_id: RAZORPAY_KEY_ID.to_string(),
            key_secret: Secret::new(RAZORPAY_KEY_SECRET.to_string()),
            webhook_secret: Secret::new(RAZORPAY_WEBHOOK_SECRET.to_string()),
            api_base_url: urls.razorpay.clone(),
            currency: "INR".to_string(),
        },
        phonepe: PhonePeConfig {
            merchant_id: PHONEPE_MERCHANT_ID.to_string(),
            salt_key: Secret::new(PHONEPE_SALT_KEY.to_string()),
            salt_index: "1".to_string(),
            api_base_url: urls.phonepe.clone(),
            redirect_url: "http://localhost:5173/payment/status".to_string(),
            callback_url: "http://localhost:5000/api/orders/phonepe/callback".to_string(),
        },
        email: EmailConfig {
            smtp: None,
            admin_address: Some(ADMIN_EMAIL.to_string()),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        swagger: SwaggerConfig { enabled: false },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Store,
    pub email: Arc<MockEmailService>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_providers(ProviderUrls::default())
    }

    pub fn with_providers(urls: ProviderUrls) -> Self {
        Self::with_config(test_config(&urls))
    }

    pub fn with_config(config: StorefrontConfig) -> Self {
        let store = Store::in_memory();
        let email = Arc::new(MockEmailService::new());
        let state = AppState::new(
            config,
            store.clone(),
            email.clone() as Arc<dyn EmailProvider>,
        )
        .expect("Failed to build app state");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            email,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a raw body with extra headers, for signed provider callbacks.
    pub async fn post_raw(&self, uri: &str, body: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Inserts a local customer directly and returns it with a token.
    pub async fn create_user(&self, name: &str, email: &str) -> (User, String) {
        let hash = hash_password(&Password::new(TEST_PASSWORD)).expect("Failed to hash");
        let user = User::new_local(name.to_string(), email.to_string(), hash.into_string());
        self.store
            .users
            .insert(&user)
            .await
            .expect("Failed to insert user");
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn create_admin(&self, name: &str, email: &str) -> (User, String) {
        let hash = hash_password(&Password::new(TEST_PASSWORD)).expect("Failed to hash");
        let mut user = User::new_local(name.to_string(), email.to_string(), hash.into_string());
        user.set_admin(true);
        self.store
            .users
            .insert(&user)
            .await
            .expect("Failed to insert admin");
        let token = self.token_for(&user);
        (user, token)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state
            .jwt
            .generate_token(&user.id, &user.email)
            .expect("Failed to issue token")
    }

    pub async fn create_product(&self, name: &str, price: f64, stock: i64) -> Product {
        self.create_product_with_shipping(name, price, stock, ShippingType::Free, 0.0)
            .await
    }

    pub async fn create_product_with_shipping(
        &self,
        name: &str,
        price: f64,
        stock: i64,
        shipping_type: ShippingType,
        shipping_charge: f64,
    ) -> Product {
        let now = mongodb::bson::DateTime::now();
        let product = Product {
            id: storefront_service::models::new_id(),
            name: name.to_string(),
            description: format!("{} description", name),
            price,
            category: "Wellness".to_string(),
            count_in_stock: stock,
            image: "https://cdn.example.com/p.jpg".to_string(),
            additional_images: Vec::new(),
            youtube_link: None,
            shipping_type,
            shipping_charge,
            created_at: now,
            updated_at: now,
        };
        self.store
            .products
            .insert(&product)
            .await
            .expect("Failed to insert product");
        product
    }
}

pub fn shipping_address() -> Value {
    serde_json::json!({
        "fullName": "Asha Rao",
        "address": "12 MG Road",
        "city": "Bengaluru",
        "postalCode": "560001",
        "country": "India",
        "phone": "9999999999"
    })
}

pub fn checkout_body(lines: &[(&str, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product, qty)| serde_json::json!({ "product": product, "qty": qty }))
        .collect();
    serde_json::json!({
        "orderItems": items,
        "shippingAddress": shipping_address(),
    })
}
