//! Razorpay Orders API client and signature checks.

use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::utils::signature::{hmac_sha256_hex, verify_hmac_sha256_hex};
use std::time::Duration;

use crate::config::RazorpayConfig;

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    /// Paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub payment_capture: u8,
    pub notes: OrderNotes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotes {
    #[serde(rename = "merchantOrderId")]
    pub merchant_order_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    /// Razorpay sends `[]` for empty notes, so this stays untyped.
    #[serde(default)]
    pub notes: serde_json::Value,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayError {
    pub error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<WebhookPaymentEntity>,
    pub order: Option<WebhookOrderEntity>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPaymentEntity {
    pub entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct WebhookOrderEntity {
    pub entity: RazorpayOrder,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    pub order_id: Option<String>,
    #[serde(default)]
    pub notes: serde_json::Value,
    pub error_description: Option<String>,
}

impl WebhookEvent {
    /// Our order id, from payment notes first, then order notes.
    pub fn merchant_order_id(&self) -> Option<&str> {
        fn from_notes(notes: &serde_json::Value) -> Option<&str> {
            notes.get("merchantOrderId").and_then(|v| v.as_str())
        }

        self.payload
            .payment
            .as_ref()
            .and_then(|p| from_notes(&p.entity.notes))
            .or_else(|| {
                self.payload
                    .order
                    .as_ref()
                    .and_then(|o| from_notes(&o.entity.notes))
            })
    }

    /// The Razorpay order id the event refers to.
    pub fn razorpay_order_id(&self) -> Option<&str> {
        self.payload
            .payment
            .as_ref()
            .and_then(|p| p.entity.order_id.as_deref())
            .or_else(|| self.payload.order.as_ref().map(|o| o.entity.id.as_str()))
    }

    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// The single outbound intent call for an order.
    pub async fn create_order(&self, amount: i64, receipt: &str, notes: OrderNotes) -> Result<RazorpayOrder> {
        if !self.is_configured() {
            return Err(anyhow!("Razorpay credentials not configured"));
        }

        let request = CreateOrderRequest {
            amount,
            currency: self.config.currency.clone(),
            receipt: receipt.to_string(),
            payment_capture: 1,
            notes,
        };

        let url = format!("{}/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: RazorpayOrder = serde_json::from_str(&body)?;
            tracing::info!(
                razorpay_order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                receipt = %receipt,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let detail = serde_json::from_str::<RazorpayError>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| RazorpayErrorDetail {
                    code: "UNKNOWN".to_string(),
                    description: body.clone(),
                });
            tracing::error!(
                status = %status,
                code = %detail.code,
                description = %detail.description,
                "Razorpay order creation failed"
            );
            Err(anyhow!(
                "Razorpay error: {} - {}",
                detail.code,
                detail.description
            ))
        }
    }

    pub async fn get_order(&self, razorpay_order_id: &str) -> Result<RazorpayOrder> {
        if !self.is_configured() {
            return Err(anyhow!("Razorpay credentials not configured"));
        }

        let url = format!("{}/orders/{}", self.config.api_base_url, razorpay_order_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(anyhow!("Failed to fetch Razorpay order ({}): {}", status, body))
        }
    }

    /// `HMAC-SHA256(order_id + "|" + payment_id, key_secret)`, hex.
    pub fn verify_payment_signature(&self, verification: &PaymentVerification) -> Result<bool> {
        let payload = format!(
            "{}|{}",
            verification.razorpay_order_id, verification.razorpay_payment_id
        );

        let is_valid = verify_hmac_sha256_hex(
            self.config.key_secret.expose_secret(),
            payload.as_bytes(),
            &verification.razorpay_signature,
        )?;

        if is_valid {
            tracing::info!(
                razorpay_order_id = %verification.razorpay_order_id,
                razorpay_payment_id = %verification.razorpay_payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                razorpay_order_id = %verification.razorpay_order_id,
                razorpay_payment_id = %verification.razorpay_payment_id,
                "Payment signature verification failed"
            );
        }

        Ok(is_valid)
    }

    /// `HMAC-SHA256(raw_body, webhook_secret)`, hex. An unset secret
    /// rejects everything.
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> Result<bool> {
        let secret = self.config.webhook_secret.expose_secret();
        if secret.is_empty() {
            tracing::error!("Razorpay webhook secret not configured, rejecting webhook");
            return Ok(false);
        }

        let is_valid = verify_hmac_sha256_hex(secret, body, signature)?;
        if !is_valid {
            tracing::warn!("Webhook signature verification failed");
        }

        Ok(is_valid)
    }

    pub fn parse_webhook_event(&self, body: &[u8]) -> Result<WebhookEvent> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Signature a checkout would produce for this order/payment pair.
    pub fn sign_payment(&self, razorpay_order_id: &str, razorpay_payment_id: &str) -> Result<String> {
        hmac_sha256_hex(
            self.config.key_secret.expose_secret(),
            format!("{}|{}", razorpay_order_id, razorpay_payment_id).as_bytes(),
        )
    }
}
