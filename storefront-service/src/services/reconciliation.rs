//! The one place an order becomes paid.
//!
//! Client verification, provider webhooks/callbacks and status polling all
//! funnel through [`PaymentReconciler::confirm`]. The store applies the
//! `unpaid -> paid` flip as a conditional update, so however many of these
//! arrive, and in whatever order, exactly one of them wins and the rest see
//! [`ConfirmationOutcome::AlreadyPaid`].

use crate::models::{ConfirmationSource, Order, PaymentProvider, PaymentResult};
use crate::services::{metrics, PaidTransition, ServiceError, Store};

#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub provider: PaymentProvider,
    pub provider_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    /// Amount the provider reports, in paise. `None` when the path carries
    /// no amount (client verify is bound by signature instead).
    pub amount_minor: Option<i64>,
    pub source: ConfirmationSource,
}

#[derive(Debug, Clone)]
pub enum ConfirmationOutcome {
    Confirmed(Order),
    AlreadyPaid(Order),
}

impl ConfirmationOutcome {
    pub fn order(&self) -> &Order {
        match self {
            ConfirmationOutcome::Confirmed(order) | ConfirmationOutcome::AlreadyPaid(order) => {
                order
            }
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            ConfirmationOutcome::Confirmed(order) | ConfirmationOutcome::AlreadyPaid(order) => {
                order
            }
        }
    }
}

#[derive(Clone)]
pub struct PaymentReconciler {
    store: Store,
}

impl PaymentReconciler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn confirm(
        &self,
        order_id: &str,
        confirmation: PaymentConfirmation,
    ) -> Result<ConfirmationOutcome, ServiceError> {
        let order = self
            .store
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound)?;

        if order.is_paid {
            tracing::info!(
                order_id = %order.id,
                source = confirmation.source.as_str(),
                "Order already paid, confirmation ignored"
            );
            return Ok(ConfirmationOutcome::AlreadyPaid(order));
        }

        if let Some(received) = confirmation.amount_minor {
            let expected = order.total_minor_units();
            if received != expected {
                tracing::warn!(
                    order_id = %order.id,
                    provider = confirmation.provider.as_str(),
                    expected = expected,
                    received = received,
                    "Payment amount does not match order total"
                );
                return Err(ServiceError::AmountMismatch { expected, received });
            }
        }

        let result = PaymentResult {
            provider: confirmation.provider,
            provider_order_id: confirmation
                .provider_order_id
                .or_else(|| order.provider_order_id().map(str::to_string)),
            payment_id: confirmation.payment_id,
            signature: confirmation.signature,
            source: Some(confirmation.source),
        };

        match self.store.orders.mark_paid(&order.id, &result).await? {
            PaidTransition::Applied(paid) => {
                metrics::record_payment_confirmed(confirmation.provider, confirmation.source);
                tracing::info!(
                    order_id = %paid.id,
                    provider = confirmation.provider.as_str(),
                    source = confirmation.source.as_str(),
                    payment_id = ?result.payment_id,
                    "Order marked as paid"
                );
                self.settle_stock(&paid).await;
                Ok(ConfirmationOutcome::Confirmed(paid))
            }
            PaidTransition::AlreadyPaid(paid) => {
                tracing::info!(
                    order_id = %paid.id,
                    source = confirmation.source.as_str(),
                    "Lost race to mark order paid"
                );
                Ok(ConfirmationOutcome::AlreadyPaid(paid))
            }
            PaidTransition::NotFound => Err(ServiceError::OrderNotFound),
        }
    }

    /// Marks an unpaid order `Payment_Failed`. Returns false when the order
    /// is missing or already paid.
    pub async fn record_failure(
        &self,
        order_id: &str,
        provider: PaymentProvider,
    ) -> Result<bool, ServiceError> {
        let updated = self.store.orders.mark_payment_failed(order_id).await?;
        if updated {
            metrics::record_payment_failed(provider);
            tracing::warn!(order_id = %order_id, provider = provider.as_str(), "Payment failed");
        }
        Ok(updated)
    }

    async fn settle_stock(&self, order: &Order) {
        match self.store.orders.claim_stock_update(&order.id).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Failed to claim stock update");
                return;
            }
        }

        for item in &order.order_items {
            if let Err(e) = self
                .store
                .products
                .decrement_stock(&item.product, item.qty)
                .await
            {
                tracing::error!(
                    order_id = %order.id,
                    product_id = %item.product,
                    error = %e,
                    "Failed to decrement stock"
                );
            }
        }
    }
}
