use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::Order;

type HmacSha256 = Hmac<Sha256>;

/// Validates that a payment-completion callback genuinely originated from
/// the payment gateway. The expected signature is
/// `HMAC-SHA256(secret, "{order_id}|{payment_id}")` as a hex digest.
///
/// Server-side only: the secret must never reach a client.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn expected_signature(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Returns true only for an authentic signature. Missing or empty
    /// input is a verification failure, not a fault.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return false;
        }
        constant_time_eq(&self.expected_signature(order_id, payment_id), signature)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

/// Order object returned by the gateway's order-creation endpoint.
/// Amounts are in minor currency units (paise).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Gateway order-creation seam. The production implementation talks to
/// the hosted gateway's REST API; tests substitute their own transport.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, ServiceError>;
}

/// Razorpay-compatible gateway client. Credentials are held server-side
/// and sent as HTTP Basic auth, exactly as the gateway's REST API expects.
pub struct RazorpayGateway {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.gateway_api_base.trim_end_matches('/').to_string(),
            key_id: config.gateway_key_id.clone(),
            key_secret: config.gateway_key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self))]
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        let body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": format!("receipt_{}", chrono::Utc::now().timestamp_millis()),
        });

        let auth = BASE64.encode(format!("{}:{}", self.key_id, self.key_secret));

        let response = self
            .http
            .post(format!("{}/v1/orders", self.api_base))
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", auth))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Gateway order creation failed: {}", e);
                ServiceError::ExternalServiceError(format!("gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "gateway order creation returned {}",
                response.status()
            )));
        }

        let order = response.json::<GatewayOrder>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid gateway response: {}", e))
        })?;

        info!("Created gateway order {}", order.id);
        Ok(order)
    }
}

/// Completion callback delivered by the hosted payment interface: either
/// the three signed identifiers, or a dismissal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatewayCompletion {
    Completed {
        razorpay_order_id: String,
        razorpay_payment_id: String,
        razorpay_signature: String,
    },
    Dismissed,
}

/// Explicit result of a hosted payment attempt. Keeps the checkout
/// transition table a plain match instead of nested callbacks.
#[derive(Debug)]
pub enum PaymentOutcome {
    VerifiedSuccess(Box<Order>),
    VerificationFailed,
    Cancelled,
}
