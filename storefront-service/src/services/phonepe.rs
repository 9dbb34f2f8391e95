//! PhonePe Standard Checkout (PG v1) client.
//!
//! Every request and callback is authenticated with an `X-VERIFY` header:
//! `sha256_hex(<payload> + <salt key>) + "###" + <salt index>`, where the
//! payload is the base64 body plus the API path for calls we make, and the
//! base64 `response` field for callbacks PhonePe makes.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::utils::signature::{constant_time_eq, sha256_hex};
use std::time::Duration;

use crate::config::PhonePeConfig;

const PAY_PATH: &str = "/pg/v1/pay";

pub const CODE_SUCCESS: &str = "PAYMENT_SUCCESS";
pub const CODE_ERROR: &str = "PAYMENT_ERROR";
pub const CODE_DECLINED: &str = "PAYMENT_DECLINED";

const STATE_COMPLETED: &str = "COMPLETED";
const STATE_FAILED: &str = "FAILED";

#[derive(Clone)]
pub struct PhonePeClient {
    client: Client,
    config: PhonePeConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPayload {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    /// Paise.
    pub amount: i64,
    pub redirect_url: String,
    pub redirect_mode: String,
    pub callback_url: String,
    pub payment_instrument: PaymentInstrument,
}

#[derive(Debug, Serialize)]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct PayResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<PayResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponseData {
    pub instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentResponse {
    pub redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectInfo {
    pub url: String,
}

/// Shape shared by the status API and the decoded callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<TransactionData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub merchant_transaction_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub response_code: Option<String>,
}

impl TransactionStatus {
    /// Outcome code such as `PAYMENT_SUCCESS` or `PAYMENT_PENDING`.
    pub fn code(&self) -> &str {
        &self.code
    }

    fn state(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.state.as_deref())
    }

    /// `data.state`, when present, must agree with the code.
    pub fn is_success(&self) -> bool {
        self.success
            && self.code == CODE_SUCCESS
            && self.state().map_or(true, |state| state == STATE_COMPLETED)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.code.as_str(), CODE_ERROR | CODE_DECLINED)
            || self.state() == Some(STATE_FAILED)
    }
}

impl PhonePeClient {
    pub fn new(config: PhonePeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.merchant_id.is_empty() && !self.config.salt_key.expose_secret().is_empty()
    }

    pub fn x_verify(&self, payload: &str) -> String {
        let digest = sha256_hex(format!("{}{}", payload, self.config.salt_key.expose_secret()).as_bytes());
        format!("{}###{}", digest, self.config.salt_index)
    }

    /// One pay-page initiation. Returns the URL the shopper is sent to.
    pub async fn create_payment(
        &self,
        merchant_transaction_id: &str,
        merchant_user_id: &str,
        amount: i64,
    ) -> Result<String> {
        if !self.is_configured() {
            return Err(anyhow!("PhonePe credentials not configured"));
        }

        let payload = PayPayload {
            merchant_id: self.config.merchant_id.clone(),
            merchant_transaction_id: merchant_transaction_id.to_string(),
            merchant_user_id: merchant_user_id.to_string(),
            amount,
            redirect_url: self.config.redirect_url.clone(),
            redirect_mode: "POST".to_string(),
            callback_url: self.config.callback_url.clone(),
            payment_instrument: PaymentInstrument {
                kind: "PAY_PAGE".to_string(),
            },
        };

        let encoded = STANDARD.encode(serde_json::to_vec(&payload)?);
        let checksum = self.x_verify(&format!("{}{}", encoded, PAY_PATH));

        let response = self
            .client
            .post(format!("{}{}", self.config.api_base_url, PAY_PATH))
            .header("X-VERIFY", checksum)
            .json(&serde_json::json!({ "request": encoded }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "PhonePe pay request failed");
            return Err(anyhow!("PhonePe error ({}): {}", status, body));
        }

        let parsed: PayResponse = serde_json::from_str(&body)?;
        let url = parsed
            .data
            .and_then(|d| d.instrument_response)
            .and_then(|i| i.redirect_info)
            .map(|r| r.url);

        match url {
            Some(url) if parsed.success => {
                tracing::info!(
                    merchant_transaction_id = %merchant_transaction_id,
                    amount = amount,
                    "PhonePe payment initiated"
                );
                Ok(url)
            }
            _ => Err(anyhow!(
                "PhonePe did not return a redirect url: {} {}",
                parsed.code,
                parsed.message.unwrap_or_default()
            )),
        }
    }

    /// Checks a callback's `X-VERIFY` against its base64 `response` field.
    pub fn verify_callback(&self, response: &str, x_verify: &str) -> bool {
        if !self.is_configured() {
            tracing::error!("PhonePe salt key not configured, rejecting callback");
            return false;
        }
        constant_time_eq(&self.x_verify(response), x_verify.trim())
    }

    pub fn decode_callback(&self, response: &str) -> Result<TransactionStatus> {
        let bytes = STANDARD.decode(response.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn check_status(&self, merchant_transaction_id: &str) -> Result<TransactionStatus> {
        if !self.is_configured() {
            return Err(anyhow!("PhonePe credentials not configured"));
        }

        let path = format!(
            "/pg/v1/status/{}/{}",
            self.config.merchant_id, merchant_transaction_id
        );

        let response = self
            .client
            .get(format!("{}{}", self.config.api_base_url, path))
            .header("X-VERIFY", self.x_verify(&path))
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // PhonePe answers non-success transactions with 4xx plus a JSON body.
        match serde_json::from_str::<TransactionStatus>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(anyhow!("PhonePe status error ({}): {}", status, body)),
        }
    }
}
