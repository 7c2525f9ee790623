use crate::errors::ApiError;
use crate::handlers::common::{created_response, map_service_error, no_content_response, success_response};
use crate::handlers::AppState;
use crate::models::{CardDetails, PaymentMethod, ShippingForm};
use crate::services::checkout::CheckoutState;
use crate::services::payments::GatewayCompletion;
use crate::services::toasts::ToastKind;
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_checkout))
        .route("/:session_id", get(get_checkout_session).delete(abort_checkout))
        .route("/:session_id/shipping", put(submit_shipping))
        .route("/:session_id/back", post(back_to_shipping))
        .route("/:session_id/pay", post(pay))
        .route("/:session_id/gateway-callback", post(gateway_callback))
}

#[derive(Debug, Deserialize)]
pub struct StartCheckoutRequest {
    pub cart_session: String,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// Start checkout from a cart
async fn start_checkout(
    State(state): State<AppState>,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .start(&payload.cart_session)
        .map_err(map_service_error)?;

    Ok(created_response(ApiResponse::success(session)))
}

/// Get checkout session
async fn get_checkout_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .get(session_id)
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(session)))
}

/// Submit shipping details; advances to the payment step when every
/// field is populated.
async fn submit_shipping(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(form): Json<ShippingForm>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .submit_shipping(session_id, form)
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(session)))
}

/// User-initiated back-navigation to the shipping step
async fn back_to_shipping(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .back_to_shipping(session_id)
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(session)))
}

/// Pay for the checkout. The hosted gateway method returns the
/// parameters for opening the payment interface; the completion arrives
/// later on the callback route. Other methods confirm inline after
/// simulated processing.
async fn pay(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<PayRequest>,
) -> Result<Response, ApiError> {
    if payload.payment_method == PaymentMethod::Gateway {
        let params = state
            .services
            .checkout
            .initiate_gateway_payment(session_id)
            .await
            .map_err(map_service_error)?;
        return Ok(success_response(ApiResponse::success(params)));
    }

    let session = state
        .services
        .checkout
        .pay_with_method(session_id, payload.payment_method, payload.card)
        .await
        .map_err(map_service_error)?;

    if session.state == CheckoutState::Confirmed {
        state
            .services
            .toasts
            .push(ToastKind::Success, "Order placed successfully!")
            .await;
    }

    Ok(success_response(ApiResponse::success(session)))
}

/// Completion callback from the hosted payment interface
async fn gateway_callback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(completion): Json<GatewayCompletion>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .services
        .checkout
        .complete_gateway_payment(session_id, completion)
        .await
        .map_err(map_service_error)?;

    if session.state == CheckoutState::Confirmed {
        state
            .services
            .toasts
            .push(ToastKind::Success, "Order placed successfully!")
            .await;
    }

    Ok(success_response(ApiResponse::success(session)))
}

/// Abort the flow, discarding in-progress form state. The cart survives.
async fn abort_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .checkout
        .abort(session_id)
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
