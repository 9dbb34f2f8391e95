//! Razorpay checkout: order creation, client-side verification, webhooks
//! and status lookups.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        order::CheckoutRequest,
        payment::{
            PaymentConfirmedResponse, RazorpayCreateResponse, RazorpayOrderSummary,
            RazorpayStatusResponse, RazorpayVerifyRequest,
        },
        SuccessResponse,
    },
    handlers::orders::load_visible_order,
    middleware::AuthUser,
    models::{ConfirmationSource, Order, PaymentProvider, PaymentResult},
    services::{
        metrics,
        razorpay::{OrderNotes, PaymentVerification, WebhookEvent},
        ConfirmationOutcome, PaymentConfirmation, ServiceError,
    },
    utils::ValidatedJson,
    AppState,
};

const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Price the cart, persist an unpaid order and open one Razorpay order for it
#[utoipa::path(
    post,
    path = "/api/orders/razorpay/create",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order created", body = RazorpayCreateResponse),
        (status = 400, description = "Empty order or insufficient stock", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::dtos::ErrorResponse),
        (status = 502, description = "Razorpay rejected the order", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CheckoutRequest>,
) -> Result<Json<RazorpayCreateResponse>, AppError> {
    if !state.razorpay.is_configured() {
        tracing::error!("Razorpay checkout requested but credentials are not configured");
        return Err(AppError::ServiceUnavailable);
    }

    let order = state
        .checkout
        .place_order(&user, req, PaymentProvider::Razorpay)
        .await?;

    let notes = OrderNotes {
        merchant_order_id: order.id.clone(),
        user_id: user.id.clone(),
    };

    let razorpay_order = state
        .razorpay
        .create_order(order.total_minor_units(), &order.id, notes)
        .await
        .map_err(|e| {
            tracing::error!(order_id = %order.id, error = %e, "Failed to create Razorpay order");
            AppError::BadGateway("Failed to create Razorpay order".to_string())
        })?;

    state
        .store
        .orders
        .attach_payment_intent(
            &order.id,
            &PaymentResult {
                provider: PaymentProvider::Razorpay,
                provider_order_id: Some(razorpay_order.id.clone()),
                payment_id: None,
                signature: None,
                source: None,
            },
        )
        .await?;

    Ok(Json(RazorpayCreateResponse {
        success: true,
        order_id: order.id,
        razorpay_order: RazorpayOrderSummary {
            id: razorpay_order.id,
            amount: razorpay_order.amount,
            currency: razorpay_order.currency,
        },
        razorpay_key_id: state.razorpay.key_id().to_string(),
    }))
}

/// Verify the checkout handler's signature and mark the order paid
#[utoipa::path(
    post,
    path = "/api/orders/razorpay/verify",
    request_body = RazorpayVerifyRequest,
    responses(
        (status = 200, description = "Order paid", body = PaymentConfirmedResponse),
        (status = 400, description = "Missing parameters or invalid signature", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<RazorpayVerifyRequest>,
) -> Result<Json<PaymentConfirmedResponse>, AppError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(payment_id), Some(razorpay_order_id), Some(signature), Some(merchant_order_id)) = (
        non_empty(req.razorpay_payment_id),
        non_empty(req.razorpay_order_id),
        non_empty(req.razorpay_signature),
        non_empty(req.merchant_order_id),
    ) else {
        return Err(AppError::bad_request("Missing verification parameters"));
    };

    let verification = PaymentVerification {
        razorpay_order_id: razorpay_order_id.clone(),
        razorpay_payment_id: payment_id.clone(),
        razorpay_signature: signature.clone(),
    };

    let is_valid = state
        .razorpay
        .verify_payment_signature(&verification)
        .map_err(AppError::InternalError)?;
    if !is_valid {
        return Err(AppError::bad_request("Invalid signature"));
    }

    let order = load_visible_order(&state, &user, &merchant_order_id).await?;

    if order.provider_order_id() != Some(razorpay_order_id.as_str()) {
        tracing::warn!(
            order_id = %order.id,
            expected = ?order.provider_order_id(),
            received = %razorpay_order_id,
            "Razorpay order id mismatch"
        );
        return Err(AppError::bad_request("Razorpay order does not match this order"));
    }

    let outcome = state
        .reconciler
        .confirm(
            &order.id,
            PaymentConfirmation {
                provider: PaymentProvider::Razorpay,
                provider_order_id: Some(razorpay_order_id),
                payment_id: Some(payment_id),
                signature: Some(signature),
                amount_minor: None,
                source: ConfirmationSource::ClientVerify,
            },
        )
        .await?;

    let message = match outcome {
        ConfirmationOutcome::Confirmed(_) => "Payment verified and order updated",
        ConfirmationOutcome::AlreadyPaid(_) => "Order already paid",
    };

    Ok(Json(PaymentConfirmedResponse {
        success: true,
        message: message.to_string(),
        order: outcome.into_order().into(),
    }))
}

/// Razorpay server-to-server events
#[utoipa::path(
    post,
    path = "/api/orders/razorpay/webhook",
    responses(
        (status = 200, description = "Acknowledged", body = SuccessResponse),
        (status = 400, description = "Invalid signature", body = crate::dtos::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let provider = PaymentProvider::Razorpay;

    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing X-Razorpay-Signature header");
        metrics::record_webhook(provider, "rejected");
        return Err(AppError::bad_request("Invalid signature"));
    };

    let is_valid = state
        .razorpay
        .verify_webhook_signature(&body, signature)
        .map_err(AppError::InternalError)?;
    if !is_valid {
        metrics::record_webhook(provider, "rejected");
        return Err(AppError::bad_request("Invalid signature"));
    }

    let event = state.razorpay.parse_webhook_event(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse webhook event");
        AppError::bad_request("Invalid webhook payload")
    })?;

    tracing::info!(event_type = %event.event, "Processing Razorpay webhook");

    let outcome = match event.event.as_str() {
        "payment.captured" | "payment.authorized" | "order.paid" => {
            handle_paid_event(&state, &event).await?
        }
        "payment.failed" => match resolve_order(&state, &event).await? {
            Some(order) => {
                if let Some(payment) = event.payment() {
                    tracing::info!(
                        order_id = %order.id,
                        payment_id = %payment.id,
                        reason = ?payment.error_description,
                        "Payment failed webhook received"
                    );
                }
                state.reconciler.record_failure(&order.id, provider).await?;
                "processed"
            }
            None => "ignored",
        },
        other => {
            tracing::debug!(event_type = %other, "Unhandled webhook event type");
            "ignored"
        }
    };

    metrics::record_webhook(provider, outcome);

    Ok(Json(SuccessResponse { success: true }))
}

async fn handle_paid_event(state: &AppState, event: &WebhookEvent) -> Result<&'static str, AppError> {
    let Some(order) = resolve_order(state, event).await? else {
        tracing::warn!(
            event_type = %event.event,
            razorpay_order_id = ?event.razorpay_order_id(),
            "No order matches webhook"
        );
        return Ok("ignored");
    };

    let payment = event.payment();
    let amount = payment.map(|p| p.amount).or_else(|| {
        event
            .payload
            .order
            .as_ref()
            .map(|o| o.entity.amount_paid.max(o.entity.amount))
    });

    let confirmation = PaymentConfirmation {
        provider: PaymentProvider::Razorpay,
        provider_order_id: event.razorpay_order_id().map(str::to_string),
        payment_id: payment.map(|p| p.id.clone()),
        signature: None,
        amount_minor: amount,
        source: ConfirmationSource::Webhook,
    };

    match state.reconciler.confirm(&order.id, confirmation).await {
        Ok(_) => Ok("processed"),
        // Acknowledged so Razorpay stops retrying; the mismatch is logged.
        Err(ServiceError::AmountMismatch { .. }) | Err(ServiceError::OrderNotFound) => Ok("ignored"),
        Err(e) => Err(e.into()),
    }
}

/// Our order id from the notes, else the stored Razorpay order id.
async fn resolve_order(state: &AppState, event: &WebhookEvent) -> Result<Option<Order>, AppError> {
    if let Some(merchant_order_id) = event.merchant_order_id() {
        if let Some(order) = state.store.orders.find_by_id(merchant_order_id).await? {
            return Ok(Some(order));
        }
    }

    match event.razorpay_order_id() {
        Some(razorpay_order_id) => {
            state
                .store
                .orders
                .find_by_provider_order_id(razorpay_order_id)
                .await
        }
        None => Ok(None),
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/razorpay/status/{merchantOrderId}",
    params(("merchantOrderId" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with Razorpay's view of it", body = RazorpayStatusResponse),
        (status = 403, description = "Not the owner", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(merchant_order_id): Path<String>,
) -> Result<Json<RazorpayStatusResponse>, AppError> {
    let order = load_visible_order(&state, &user, &merchant_order_id).await?;

    let (data, info) = match order.provider_order_id() {
        Some(razorpay_order_id) => match state.razorpay.get_order(razorpay_order_id).await {
            Ok(remote) => (serde_json::to_value(remote).ok(), None),
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Could not fetch Razorpay order");
                (None, Some("Could not fetch from Razorpay".to_string()))
            }
        },
        None => (None, None),
    };

    Ok(Json(RazorpayStatusResponse {
        success: true,
        order: order.into(),
        data,
        info,
    }))
}
