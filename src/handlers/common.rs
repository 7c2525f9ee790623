use crate::config::AppConfig;
use crate::errors::{ApiError, ServiceError};
use crate::models::PricingPolicy;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Pricing constants as configured, for summary computation in handlers.
pub fn pricing_policy(config: &AppConfig) -> PricingPolicy {
    PricingPolicy {
        free_shipping_threshold: config.free_shipping_threshold,
        shipping_flat_fee: config.shipping_flat_fee,
        tax_rate: config.tax_rate,
    }
}
