use crate::handlers::common::no_content_response;
use crate::handlers::AppState;
use crate::models::{Notification, NotificationInput, NotificationKind};
use crate::services::notifications::DashboardStats;
use axum::{
    extract::{Json, State},
    response::Response,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full notification payload as posted by producers outside this
/// process. In-process producers go through the event channel instead.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotificationRequest {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub order_value: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotificationResponse {
    pub success: bool,
    pub sms_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub stats: DashboardStats,
    pub notifications: Vec<Notification>,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/notifications",
        post(ingest_notification)
            .get(list_notifications)
            .delete(clear_notifications),
    )
}

/// Ingest a notification into the admin log, fanning out to SMS when the
/// kind is eligible. SMS delivery is fire-and-forget; the response only
/// reports whether a send was attempted.
#[utoipa::path(
    post,
    path = "/api/admin/notifications",
    request_body = AdminNotificationRequest,
    responses(
        (status = 200, description = "Notification processed", body = AdminNotificationResponse)
    ),
    tag = "Admin"
)]
pub async fn ingest_notification(
    State(state): State<AppState>,
    Json(payload): Json<AdminNotificationRequest>,
) -> Json<AdminNotificationResponse> {
    let sms_sent = state.services.notifications.sms_eligible(payload.kind);

    let mut input = NotificationInput::new(payload.kind, payload.message);
    if let Some(email) = payload.user_email {
        input = input.with_user_email(email);
    }
    if let Some(product) = payload.product_name {
        input = input.with_product_name(product);
    }
    if let Some(value) = payload.order_value {
        input = input.with_order_value(value);
    }

    state.services.notifications.record(input).await;

    Json(AdminNotificationResponse {
        success: true,
        sms_sent,
    })
}

/// Dashboard view: derived statistics plus the capped log, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/notifications",
    responses(
        (status = 200, description = "Notification log and statistics", body = AdminDashboardResponse)
    ),
    tag = "Admin"
)]
pub async fn list_notifications(State(state): State<AppState>) -> Json<AdminDashboardResponse> {
    let hub = &state.services.notifications;
    Json(AdminDashboardResponse {
        stats: hub.dashboard_stats().await,
        notifications: hub.notifications().await,
    })
}

pub async fn clear_notifications(State(state): State<AppState>) -> Response {
    state.services.notifications.clear().await;
    no_content_response()
}
