use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{map_service_error, validate_input};
use crate::handlers::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SmsSendRequest {
    #[validate(length(min = 1))]
    #[schema(example = "+91 9876543210")]
    pub to: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(rename = "type")]
    #[schema(example = "order_placed")]
    pub kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmsSendResponse {
    pub success: bool,
    pub message_id: String,
}

pub fn sms_routes() -> Router<AppState> {
    Router::new().route("/send", post(send_sms))
}

/// Send an SMS through the configured sender. The bundled sender only
/// simulates delivery.
#[utoipa::path(
    post,
    path = "/api/sms/send",
    request_body = SmsSendRequest,
    responses(
        (status = 200, description = "SMS accepted", body = SmsSendResponse),
        (status = 502, description = "Delivery failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Sms"
)]
pub async fn send_sms(
    State(state): State<AppState>,
    Json(payload): Json<SmsSendRequest>,
) -> Result<Json<SmsSendResponse>, ApiError> {
    validate_input(&payload)?;

    let receipt = state
        .services
        .sms
        .send(&payload.to, &payload.message, &payload.kind)
        .await
        .map_err(|e| map_service_error(ServiceError::ExternalServiceError(e.to_string())))?;

    Ok(Json(SmsSendResponse {
        success: true,
        message_id: receipt.message_id,
    }))
}
