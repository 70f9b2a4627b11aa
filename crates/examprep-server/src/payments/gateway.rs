// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use examprep_core::DocumentId;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{Display, Formatter};
use tracing::{info, instrument};

use crate::config::PaymentConfig;

/// Order as returned by the gateway and forwarded to the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError(pub String);

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GatewayError {}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    fn gateway_tag(&self) -> &'static str;

    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

/// Issues local order ids; nothing leaves the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    fn gateway_tag(&self) -> &'static str {
        "offline"
    }

    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            id: format!("order_{}", DocumentId::generate()),
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: Some("created".to_string()),
        })
    }
}

pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    #[must_use]
    pub fn new(cfg: &PaymentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            key_id: cfg.key_id.clone(),
            key_secret: cfg.key_secret.clone(),
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let credentials = STANDARD.encode(format!("{}:{}", self.key_id, self.key_secret));
        let value = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| GatewayError(format!("invalid auth header: {e}")))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn gateway_tag(&self) -> &'static str {
        "razorpay"
    }

    #[instrument(name = "razorpay_create_order", skip(self))]
    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&json!({"amount": amount, "currency": currency, "receipt": receipt}))
            .send()
            .await
            .map_err(|e| GatewayError(format!("order request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError(format!("order request rejected status={status}")));
        }
        let order: GatewayOrder = resp
            .json()
            .await
            .map_err(|e| GatewayError(format!("order response unreadable: {e}")))?;
        info!(order_id = %order.id, amount, "gateway order created");
        Ok(order)
    }
}

/// Receipt reference sent with a new order, capped at the gateway's 40 chars.
#[must_use]
pub fn order_receipt_ref(now_secs: i64) -> String {
    let mut receipt = format!("receipt_{now_secs}");
    receipt.truncate(40);
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_orders_are_unique_and_echo_the_amount() {
        let gw = OfflineGateway;
        let a = gw.create_order(49_900, "INR", "receipt_1").await.expect("order");
        let b = gw.create_order(49_900, "INR", "receipt_1").await.expect("order");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("order_"));
        assert_eq!(a.amount, 49_900);
        assert_eq!(a.currency, "INR");
    }

    #[test]
    fn basic_auth_header_encodes_key_pair() {
        let gw = RazorpayGateway::new(&PaymentConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "shh".to_string(),
            ..PaymentConfig::default()
        });
        let headers = gw.auth_headers().expect("headers");
        let value = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        assert_eq!(value, Some("Basic cnpwX3Rlc3Rfa2V5OnNoaA=="));
    }

    #[test]
    fn receipt_ref_is_bounded() {
        assert_eq!(order_receipt_ref(1_700_000_000), "receipt_1700000000");
        assert!(order_receipt_ref(i64::MAX).len() <= 40);
    }
}
