use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Address;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum OrderStatus {
    Processing,
    Paid,
    #[serde(rename = "Payment_Failed")]
    PaymentFailed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Paid => "Paid",
            OrderStatus::PaymentFailed => "Payment_Failed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// `Paid` and `Payment_Failed` belong to the payment paths.
    pub fn is_payment_outcome(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::PaymentFailed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Razorpay,
    Phonepe,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Razorpay => "razorpay",
            PaymentProvider::Phonepe => "phonepe",
        }
    }
}

/// Which path delivered a payment confirmation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationSource {
    ClientVerify,
    Webhook,
    StatusCheck,
}

impl ConfirmationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSource::ClientVerify => "client_verify",
            ConfirmationSource::Webhook => "webhook",
            ConfirmationSource::StatusCheck => "status_check",
        }
    }
}

/// A priced line. `price` is the product price at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub qty: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub provider: PaymentProvider,
    /// Provider-side intent id: Razorpay order id, PhonePe merchant transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfirmationSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: PaymentProvider,
    pub items_price: f64,
    pub shipping_price: f64,
    pub tax_price: f64,
    pub total_price: f64,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime>,
    pub is_delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime>,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    /// Set once stock has been decremented for this order.
    #[serde(default)]
    pub stock_updated: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Order {
    /// Amount to collect, in paise.
    pub fn total_minor_units(&self) -> i64 {
        crate::services::pricing::to_minor_units(self.total_price)
    }

    pub fn provider_order_id(&self) -> Option<&str> {
        self.payment_result
            .as_ref()
            .and_then(|r| r.provider_order_id.as_deref())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user == user_id
    }
}
