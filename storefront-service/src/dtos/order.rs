use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::to_utc;
use crate::models::{Address, Order, OrderItem, OrderStatus, PaymentProvider, PaymentResult};
use crate::services::pricing::OrderLineRequest;

/// Checkout body. Any prices or totals a client adds are ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub order_items: Vec<OrderLineRequest>,
    #[validate(nested)]
    pub shipping_address: Address,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user: o.user,
            order_items: o.order_items,
            shipping_address: o.shipping_address,
            payment_method: o.payment_method,
            items_price: o.items_price,
            shipping_price: o.shipping_price,
            tax_price: o.tax_price,
            total_price: o.total_price,
            is_paid: o.is_paid,
            paid_at: o.paid_at.map(to_utc),
            is_delivered: o.is_delivered,
            delivered_at: o.delivered_at.map(to_utc),
            status: o.status,
            payment_result: o.payment_result,
            created_at: to_utc(o.created_at),
            updated_at: to_utc(o.updated_at),
        }
    }
}
