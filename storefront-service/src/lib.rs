pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::StorefrontConfig;
use crate::services::{
    AccountService, CheckoutService, EmailProvider, JwtService, OAuthService,
    PaymentReconciler, PhonePeClient, RazorpayClient, Store,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::readiness_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::list_categories,
        handlers::catalog::get_category,
        handlers::catalog::create_category,
        handlers::cart::get_cart,
        handlers::cart::merge_cart,
        handlers::orders::my_orders,
        handlers::orders::get_order,
        handlers::razorpay::create_order,
        handlers::razorpay::verify_payment,
        handlers::razorpay::webhook,
        handlers::razorpay::payment_status,
        handlers::phonepe::create_payment,
        handlers::phonepe::callback,
        handlers::phonepe::payment_status,
        handlers::contact::submit,
        handlers::blog::list_posts,
        handlers::blog::get_post,
        handlers::admin::products::list_products,
        handlers::admin::products::create_product,
        handlers::admin::products::update_product,
        handlers::admin::products::delete_product,
        handlers::admin::orders::list_orders,
        handlers::admin::orders::get_order,
        handlers::admin::orders::update_status,
        handlers::admin::orders::delete_order,
        handlers::admin::users::list_users,
        handlers::admin::users::update_role,
        handlers::admin::users::delete_user,
        handlers::admin::messages::list_messages,
        handlers::admin::messages::count_messages,
        handlers::admin::messages::delete_message,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::SuccessResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::AuthResponse,
            dtos::auth::UserSummary,
            dtos::auth::UserResponse,
            dtos::catalog::ProductRequest,
            dtos::catalog::ProductUpdateRequest,
            dtos::catalog::ProductResponse,
            dtos::catalog::CategoryRequest,
            dtos::catalog::CategoryResponse,
            dtos::catalog::BlogPostResponse,
            dtos::cart::MergeCartRequest,
            dtos::cart::CartResponse,
            dtos::order::CheckoutRequest,
            dtos::order::OrderResponse,
            dtos::payment::RazorpayOrderSummary,
            dtos::payment::RazorpayCreateResponse,
            dtos::payment::RazorpayVerifyRequest,
            dtos::payment::PaymentConfirmedResponse,
            dtos::payment::RazorpayStatusResponse,
            dtos::payment::PhonePeCreateResponse,
            dtos::payment::PhonePeCallbackRequest,
            dtos::payment::PhonePeStatusResponse,
            dtos::admin::PageMeta,
            dtos::admin::OrderPage,
            dtos::admin::RoleUpdateRequest,
            dtos::admin::StatusUpdateRequest,
            dtos::admin::CountResponse,
            dtos::admin::MessageView,
            dtos::contact::ContactRequest,
            dtos::contact::ContactResponse,
            services::pricing::OrderLineRequest,
            models::Address,
            models::AuthProvider,
            models::Role,
            models::CartItem,
            models::ShippingType,
            models::OrderItem,
            models::OrderStatus,
            models::PaymentProvider,
            models::PaymentResult,
            models::ConfirmationSource,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Local and social sign-in"),
        (name = "Catalog", description = "Products and categories"),
        (name = "Cart", description = "Saved shopping cart"),
        (name = "Orders", description = "Customer order history"),
        (name = "Payments", description = "Razorpay and PhonePe checkout"),
        (name = "Contact", description = "Contact form"),
        (name = "Content", description = "Blog"),
        (name = "Admin", description = "Back-office operations"),
        (name = "Health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: StorefrontConfig,
    pub store: Store,
    pub jwt: JwtService,
    pub accounts: AccountService,
    pub checkout: CheckoutService,
    pub reconciler: PaymentReconciler,
    pub razorpay: RazorpayClient,
    pub phonepe: PhonePeClient,
    pub oauth: OAuthService,
    pub email: Arc<dyn EmailProvider>,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: StorefrontConfig,
        store: Store,
        email: Arc<dyn EmailProvider>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let razorpay = RazorpayClient::new(config.razorpay.clone());
        if !razorpay.is_configured() {
            tracing::warn!("Razorpay credentials not configured - Razorpay checkout disabled");
        }

        let phonepe = PhonePeClient::new(config.phonepe.clone());
        if !phonepe.is_configured() {
            tracing::warn!("PhonePe credentials not configured - PhonePe checkout disabled");
        }

        let limits = &config.rate_limit;

        Ok(Self {
            accounts: AccountService::new(store.clone(), jwt.clone()),
            checkout: CheckoutService::new(store.clone()),
            reconciler: PaymentReconciler::new(store.clone()),
            oauth: OAuthService::new(&config.oauth),
            login_rate_limiter: create_ip_rate_limiter(
                limits.login_attempts,
                limits.login_window_seconds,
            ),
            register_rate_limiter: create_ip_rate_limiter(
                limits.register_attempts,
                limits.register_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                limits.global_ip_limit,
                limits.global_ip_window_seconds,
            ),
            razorpay,
            phonepe,
            jwt,
            store,
            email,
            config,
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let customer_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/users/cart",
            get(handlers::cart::get_cart).post(handlers::cart::merge_cart),
        )
        .route("/api/orders/myorders", get(handlers::orders::my_orders))
        .route("/api/orders/:id", get(handlers::orders::get_order))
        .route(
            "/api/orders/razorpay/create",
            post(handlers::razorpay::create_order),
        )
        .route(
            "/api/orders/razorpay/verify",
            post(handlers::razorpay::verify_payment),
        )
        .route(
            "/api/orders/razorpay/status/:merchant_order_id",
            get(handlers::razorpay::payment_status),
        )
        .route(
            "/api/orders/phonepe/create",
            post(handlers::phonepe::create_payment),
        )
        .route(
            "/api/orders/phonepe/status/:merchant_order_id",
            get(handlers::phonepe::payment_status),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/categories", post(handlers::catalog::create_category))
        .route(
            "/api/admin/products",
            get(handlers::admin::products::list_products)
                .post(handlers::admin::products::create_product),
        )
        .route(
            "/api/admin/products/:id",
            put(handlers::admin::products::update_product)
                .delete(handlers::admin::products::delete_product),
        )
        .route(
            "/api/admin/orders",
            get(handlers::admin::orders::list_orders),
        )
        .route(
            "/api/admin/orders/:id",
            get(handlers::admin::orders::get_order).delete(handlers::admin::orders::delete_order),
        )
        .route(
            "/api/admin/orders/:id/status",
            put(handlers::admin::orders::update_status),
        )
        .route("/api/admin/users", get(handlers::admin::users::list_users))
        .route(
            "/api/admin/users/:id/role",
            put(handlers::admin::users::update_role),
        )
        .route(
            "/api/admin/users/:id",
            delete(handlers::admin::users::delete_user),
        )
        .route(
            "/api/admin/messages",
            get(handlers::admin::messages::list_messages),
        )
        .route(
            "/api/admin/messages/count",
            get(handlers::admin::messages::count_messages),
        )
        .route(
            "/api/admin/messages/:id",
            delete(handlers::admin::messages::delete_message),
        )
        .layer(from_fn(middleware::admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics));

    if state.config.swagger.enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );
    }

    let cors = cors_layer(&state.config.security.allowed_origins);
    let ip_limiter = state.ip_rate_limiter.clone();

    app.route("/api/products", get(handlers::catalog::list_products))
        .route("/api/products/:id", get(handlers::catalog::get_product))
        .route("/api/categories", get(handlers::catalog::list_categories))
        .route("/api/categories/:id", get(handlers::catalog::get_category))
        .route("/api/blog", get(handlers::blog::list_posts))
        .route("/api/blog/:slug", get(handlers::blog::get_post))
        .route("/api/contact", post(handlers::contact::submit))
        .route("/api/auth/google", get(handlers::oauth::google_login))
        .route(
            "/api/auth/google/callback",
            get(handlers::oauth::google_callback),
        )
        .route("/api/auth/facebook", get(handlers::oauth::facebook_login))
        .route(
            "/api/auth/facebook/callback",
            get(handlers::oauth::facebook_callback),
        )
        .route(
            "/api/orders/razorpay/webhook",
            post(handlers::razorpay::webhook),
        )
        .route(
            "/api/orders/phonepe/callback",
            post(handlers::phonepe::callback),
        )
        .merge(login_route)
        .merge(register_route)
        .merge(customer_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}
