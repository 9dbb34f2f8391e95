use mongodb::bson::DateTime;
use std::collections::HashMap;

use crate::dtos::order::CheckoutRequest;
use crate::models::{new_id, Order, OrderStatus, PaymentProvider, User};
use crate::services::{metrics, pricing, ServiceError, Store};

/// Turns a checkout request into a persisted, unpaid order.
#[derive(Clone)]
pub struct CheckoutService {
    store: Store,
}

impl CheckoutService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn place_order(
        &self,
        user: &User,
        req: CheckoutRequest,
        provider: PaymentProvider,
    ) -> Result<Order, ServiceError> {
        if req.order_items.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        let mut ids: Vec<String> = req.order_items.iter().map(|l| l.product.clone()).collect();
        ids.sort();
        ids.dedup();

        let catalog: HashMap<String, _> = self
            .store
            .products
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let priced = pricing::price_order(&req.order_items, &catalog)?;

        let now = DateTime::now();
        let order = Order {
            id: new_id(),
            user: user.id.clone(),
            items_price: priced.items_price(),
            shipping_price: priced.shipping_price(),
            tax_price: 0.0,
            total_price: priced.total_price(),
            order_items: priced.items,
            shipping_address: req.shipping_address,
            payment_method: provider,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            status: OrderStatus::Processing,
            payment_result: None,
            stock_updated: false,
            created_at: now,
            updated_at: now,
        };

        self.store.orders.insert(&order).await?;
        metrics::record_order_created(provider);

        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            provider = provider.as_str(),
            total_price = order.total_price,
            items = order.order_items.len(),
            "Order created"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Product, ShippingType};
    use crate::services::pricing::OrderLineRequest;

    fn product(id: &str, price: f64, shipping_type: ShippingType, charge: f64) -> Product {
        let now = DateTime::now();
        Product {
            id: id.to_string(),
            name: format!("Item {}", id),
            description: "d".to_string(),
            price,
            category: "c".to_string(),
            count_in_stock: 5,
            image: format!("/img/{}.jpg", id),
            additional_images: vec![],
            youtube_link: None,
            shipping_type,
            shipping_charge: charge,
            created_at: now,
            updated_at: now,
        }
    }

    fn address() -> Address {
        Address {
            full_name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
            phone: "9999999999".to_string(),
        }
    }

    fn line(product: &str, qty: u32) -> OrderLineRequest {
        OrderLineRequest {
            product: product.to_string(),
            qty,
        }
    }

    #[tokio::test]
    async fn prices_from_store_and_persists_unpaid_order() {
        let store = Store::in_memory();
        store
            .products
            .insert(&product("p1", 250.0, ShippingType::Free, 0.0))
            .await
            .unwrap();
        store
            .products
            .insert(&product("p2", 100.5, ShippingType::Cod, 40.0))
            .await
            .unwrap();
        let user = User::new_local("A".into(), "a@example.com".into(), "h".into());

        let order = CheckoutService::new(store.clone())
            .place_order(
                &user,
                CheckoutRequest {
                    order_items: vec![line("p1", 2), line("p2", 1)],
                    shipping_address: address(),
                },
                PaymentProvider::Razorpay,
            )
            .await
            .unwrap();

        assert_eq!(order.items_price, 600.5);
        assert_eq!(order.shipping_price, 40.0);
        assert_eq!(order.total_price, 640.5);
        assert_eq!(order.total_minor_units(), 64_050);
        assert!(!order.is_paid);
        assert_eq!(order.status, OrderStatus::Processing);

        let stored = store.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.user, user.id);
    }

    #[tokio::test]
    async fn unknown_product_fails_whole_order() {
        let store = Store::in_memory();
        let user = User::new_local("A".into(), "a@example.com".into(), "h".into());

        let err = CheckoutService::new(store.clone())
            .place_order(
                &user,
                CheckoutRequest {
                    order_items: vec![line("missing", 1)],
                    shipping_address: address(),
                },
                PaymentProvider::Phonepe,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ProductNotFound(id) if id == "missing"));
        assert!(store.orders.list_for_user(&user.id).await.unwrap().is_empty());
    }
}
