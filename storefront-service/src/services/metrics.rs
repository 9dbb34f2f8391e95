use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::models::{ConfirmationSource, PaymentProvider};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_order_created(provider: PaymentProvider) {
    counter!("storefront_orders_created_total", "provider" => provider.as_str()).increment(1);
}

pub fn record_payment_confirmed(provider: PaymentProvider, source: ConfirmationSource) {
    counter!(
        "storefront_payments_confirmed_total",
        "provider" => provider.as_str(),
        "source" => source.as_str()
    )
    .increment(1);
}

pub fn record_payment_failed(provider: PaymentProvider) {
    counter!("storefront_payments_failed_total", "provider" => provider.as_str()).increment(1);
}

/// `outcome` is one of `rejected`, `processed`, `ignored`.
pub fn record_webhook(provider: PaymentProvider, outcome: &'static str) {
    counter!(
        "storefront_payment_webhooks_total",
        "provider" => provider.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
