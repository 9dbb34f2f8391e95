use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::order::OrderResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RazorpayOrderSummary {
    #[schema(example = "order_NFx1c2d3e4")]
    pub id: String,
    /// Paise.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayCreateResponse {
    pub success: bool,
    pub order_id: String,
    pub razorpay_order: RazorpayOrderSummary,
    pub razorpay_key_id: String,
}

/// Fields are optional so that absence answers 400 rather than 422.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayVerifyRequest {
    pub razorpay_payment_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub merchant_order_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentConfirmedResponse {
    pub success: bool,
    #[schema(example = "Payment verified")]
    pub message: String,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RazorpayStatusResponse {
    pub success: bool,
    pub order: OrderResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhonePeCreateResponse {
    pub success: bool,
    pub order_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhonePeCallbackRequest {
    /// Base64-encoded transaction payload.
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhonePeStatusResponse {
    pub success: bool,
    pub order: OrderResponse,
    #[schema(example = "PAYMENT_SUCCESS")]
    pub code: String,
}
