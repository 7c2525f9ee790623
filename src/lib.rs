//! Storefront API Library
//!
//! This crate provides the core functionality for the storefront backend:
//! cart and wishlist state, checkout orchestration with hosted-gateway
//! payment verification, and the admin notification fan-out.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The `/api` surface: payment orchestration, auth, admin notifications,
/// SMS, and the cart/checkout/toast state endpoints.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-order",
            axum::routing::post(handlers::payments::create_order),
        )
        .route(
            "/verify-payment",
            axum::routing::post(handlers::payments::verify_payment),
        )
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .nest("/sms", handlers::sms::sms_routes())
        .nest("/carts", handlers::carts::cart_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/toasts", handlers::toasts::toast_routes())
}

/// Full application router: liveness, health, the `/api` surface, and
/// the OpenAPI document, with HTTP tracing applied.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/health", get(health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse<Value>> {
    let health_data = json!({
        "status": "healthy",
        "service": "storefront-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Json(ApiResponse::success(health_data))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_includes_metadata() {
        let response = ApiResponse::success("ok");

        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn validation_errors_response_lists_failures() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);

        assert!(!response.success);
        assert_eq!(response.errors.as_deref(), Some(&["missing".to_string()][..]));
    }
}
