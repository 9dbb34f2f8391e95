//! PhonePe pay-page checkout, server callback and status polling.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        order::CheckoutRequest,
        payment::{PhonePeCallbackRequest, PhonePeCreateResponse, PhonePeStatusResponse},
        SuccessResponse,
    },
    handlers::orders::load_visible_order,
    middleware::AuthUser,
    models::{ConfirmationSource, PaymentProvider, PaymentResult},
    services::{
        metrics,
        phonepe::{TransactionStatus, CODE_SUCCESS},
        PaymentConfirmation, ServiceError,
    },
    utils::ValidatedJson,
    AppState,
};

const VERIFY_HEADER: &str = "X-VERIFY";

/// Price the cart, persist an unpaid order and start one PhonePe payment
#[utoipa::path(
    post,
    path = "/api/orders/phonepe/create",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment initiated", body = PhonePeCreateResponse),
        (status = 400, description = "Empty order or insufficient stock", body = crate::dtos::ErrorResponse),
        (status = 502, description = "PhonePe rejected the payment", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CheckoutRequest>,
) -> Result<Json<PhonePeCreateResponse>, AppError> {
    if !state.phonepe.is_configured() {
        tracing::error!("PhonePe checkout requested but credentials are not configured");
        return Err(AppError::ServiceUnavailable);
    }

    let order = state
        .checkout
        .place_order(&user, req, PaymentProvider::Phonepe)
        .await?;

    let redirect_url = state
        .phonepe
        .create_payment(&order.id, &user.id, order.total_minor_units())
        .await
        .map_err(|e| {
            tracing::error!(order_id = %order.id, error = %e, "Failed to initiate PhonePe payment");
            AppError::BadGateway("Failed to initiate PhonePe payment".to_string())
        })?;

    state
        .store
        .orders
        .attach_payment_intent(
            &order.id,
            &PaymentResult {
                provider: PaymentProvider::Phonepe,
                provider_order_id: Some(order.id.clone()),
                payment_id: None,
                signature: None,
                source: None,
            },
        )
        .await?;

    Ok(Json(PhonePeCreateResponse {
        success: true,
        order_id: order.id,
        redirect_url,
    }))
}

/// PhonePe server-to-server callback
#[utoipa::path(
    post,
    path = "/api/orders/phonepe/callback",
    request_body = PhonePeCallbackRequest,
    responses(
        (status = 200, description = "Acknowledged", body = SuccessResponse),
        (status = 400, description = "Invalid signature", body = crate::dtos::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PhonePeCallbackRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let provider = PaymentProvider::Phonepe;

    let x_verify = headers
        .get(VERIFY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if req.response.is_empty() || !state.phonepe.verify_callback(&req.response, x_verify) {
        tracing::warn!("PhonePe callback failed checksum verification");
        metrics::record_webhook(provider, "rejected");
        return Err(AppError::bad_request("Invalid signature"));
    }

    let status = state.phonepe.decode_callback(&req.response).map_err(|e| {
        tracing::error!(error = %e, "Failed to decode PhonePe callback");
        AppError::bad_request("Invalid callback payload")
    })?;

    let outcome = apply_status(&state, &status, ConfirmationSource::Webhook).await?;
    metrics::record_webhook(provider, outcome);

    Ok(Json(SuccessResponse { success: true }))
}

/// Ask PhonePe for the transaction state and apply it
#[utoipa::path(
    get,
    path = "/api/orders/phonepe/status/{merchantOrderId}",
    params(("merchantOrderId" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Current state", body = PhonePeStatusResponse),
        (status = 400, description = "Not a PhonePe order", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::dtos::ErrorResponse),
        (status = 502, description = "PhonePe unreachable", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(merchant_order_id): Path<String>,
) -> Result<Json<PhonePeStatusResponse>, AppError> {
    let order = load_visible_order(&state, &user, &merchant_order_id).await?;

    if order.payment_method != PaymentProvider::Phonepe {
        return Err(AppError::bad_request("Order was not placed with PhonePe"));
    }

    if order.is_paid {
        return Ok(Json(PhonePeStatusResponse {
            success: true,
            order: order.into(),
            code: CODE_SUCCESS.to_string(),
        }));
    }

    let status = state.phonepe.check_status(&order.id).await.map_err(|e| {
        tracing::error!(order_id = %order.id, error = %e, "PhonePe status check failed");
        AppError::BadGateway("Could not fetch status from PhonePe".to_string())
    })?;

    apply_status(&state, &status, ConfirmationSource::StatusCheck).await?;

    let order = state
        .store
        .orders
        .find_by_id(&order.id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    Ok(Json(PhonePeStatusResponse {
        success: status.is_success(),
        code: status.code().to_string(),
        order: order.into(),
    }))
}

/// Shared by the callback and the status poll.
async fn apply_status(
    state: &AppState,
    status: &TransactionStatus,
    source: ConfirmationSource,
) -> Result<&'static str, AppError> {
    let Some(data) = &status.data else {
        tracing::warn!(code = %status.code, "PhonePe status without transaction data");
        return Ok("ignored");
    };

    if status.is_success() {
        let confirmation = PaymentConfirmation {
            provider: PaymentProvider::Phonepe,
            provider_order_id: Some(data.merchant_transaction_id.clone()),
            payment_id: data.transaction_id.clone(),
            signature: None,
            amount_minor: Some(data.amount),
            source,
        };

        return match state
            .reconciler
            .confirm(&data.merchant_transaction_id, confirmation)
            .await
        {
            Ok(_) => Ok("processed"),
            Err(ServiceError::AmountMismatch { .. }) | Err(ServiceError::OrderNotFound)
                if source == ConfirmationSource::Webhook =>
            {
                Ok("ignored")
            }
            Err(e) => Err(e.into()),
        };
    }

    if status.is_failure() {
        state
            .reconciler
            .record_failure(&data.merchant_transaction_id, PaymentProvider::Phonepe)
            .await?;
        return Ok("processed");
    }

    tracing::info!(
        merchant_transaction_id = %data.merchant_transaction_id,
        code = %status.code(),
        "PhonePe transaction not final"
    );
    Ok("ignored")
}
