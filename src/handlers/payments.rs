use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, validate_input};
use crate::handlers::AppState;
use crate::services::payments::GatewayOrder;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Amount in minor currency units (paise)
    #[validate(range(min = 100))]
    #[schema(example = 188800)]
    pub amount: i64,
    /// ISO currency code; defaults to the configured currency
    #[schema(example = "INR")]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
}

/// Create a gateway order for a hosted payment flow. The gateway
/// credentials stay server-side; the client only sees the order object.
#[utoipa::path(
    post,
    path = "/api/create-order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Gateway order created", body = GatewayOrder),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<GatewayOrder>, ApiError> {
    validate_input(&payload)?;

    let currency = payload
        .currency
        .unwrap_or_else(|| state.config.currency.clone());

    let order = state
        .services
        .gateway
        .create_order(payload.amount, &currency)
        .await
        .map_err(map_service_error)?;

    Ok(Json(order))
}

/// Verify a payment-completion callback against the gateway's signature
/// scheme. Missing fields are a verification failure, not a fault.
#[utoipa::path(
    post,
    path = "/api/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified", body = VerifyPaymentResponse),
        (status = 400, description = "Verification failed", body = VerifyPaymentResponse)
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> (StatusCode, Json<VerifyPaymentResponse>) {
    let (Some(order_id), Some(payment_id), Some(signature)) = (
        payload.razorpay_order_id,
        payload.razorpay_payment_id,
        payload.razorpay_signature,
    ) else {
        warn!("Payment verification request with missing fields");
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                success: false,
                message: "Payment verification failed".to_string(),
            }),
        );
    };

    if state.services.verifier.verify(&order_id, &payment_id, &signature) {
        (
            StatusCode::OK,
            Json(VerifyPaymentResponse {
                success: true,
                message: "Payment verified successfully".to_string(),
            }),
        )
    } else {
        warn!("Payment verification failed for gateway order {}", order_id);
        (
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                success: false,
                message: "Payment verification failed".to_string(),
            }),
        )
    }
}
