//! Server-side order pricing.
//!
//! Only product ids and quantities come from the client. Prices, names,
//! images and shipping rules are read from the stored product records, and
//! all sums are taken in paise.

use std::collections::HashMap;

use serde::Deserialize;
use utoipa::ToSchema;

use super::ServiceError;
use crate::models::{OrderItem, Product, ShippingType};

/// Rupees to paise, rounded half away from zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_minor_units(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// What a client may say about a line. Any price it sends is ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    #[serde(alias = "_id")]
    pub product: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub items: Vec<OrderItem>,
    pub items_minor: i64,
    pub shipping_minor: i64,
}

impl PricedOrder {
    pub fn total_minor(&self) -> i64 {
        self.items_minor + self.shipping_minor
    }

    pub fn items_price(&self) -> f64 {
        from_minor_units(self.items_minor)
    }

    pub fn shipping_price(&self) -> f64 {
        from_minor_units(self.shipping_minor)
    }

    pub fn total_price(&self) -> f64 {
        from_minor_units(self.total_minor())
    }
}

pub fn price_order(
    lines: &[OrderLineRequest],
    catalog: &HashMap<String, Product>,
) -> Result<PricedOrder, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::EmptyOrder);
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut items_minor = 0i64;
    let mut shipping_minor = 0i64;

    for line in lines {
        let product = catalog
            .get(&line.product)
            .ok_or_else(|| ServiceError::ProductNotFound(line.product.clone()))?;

        if line.qty == 0 {
            return Err(ServiceError::InvalidQuantity(product.id.clone()));
        }
        if i64::from(line.qty) > product.count_in_stock {
            return Err(ServiceError::InsufficientStock(product.name.clone()));
        }

        let qty = i64::from(line.qty);
        items_minor = line_total(product.price, qty)
            .and_then(|amount| items_minor.checked_add(amount))
            .ok_or(ServiceError::TotalOutOfRange)?;
        if product.shipping_type == ShippingType::Cod {
            shipping_minor = line_total(product.shipping_charge, qty)
                .and_then(|amount| shipping_minor.checked_add(amount))
                .ok_or(ServiceError::TotalOutOfRange)?;
        }

        items.push(OrderItem {
            product: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price,
            qty: line.qty,
        });
    }

    items_minor
        .checked_add(shipping_minor)
        .ok_or(ServiceError::TotalOutOfRange)?;

    Ok(PricedOrder {
        items,
        items_minor,
        shipping_minor,
    })
}

/// `None` when the unit price is not finite or the product overflows paise.
fn line_total(unit_price: f64, qty: i64) -> Option<i64> {
    let unit = (unit_price * 100.0).round();
    if !unit.is_finite() || unit < 0.0 || unit >= i64::MAX as f64 {
        return None;
    }
    (unit as i64).checked_mul(qty)
}
