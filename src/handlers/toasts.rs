use crate::handlers::common::{no_content_response, success_response};
use crate::handlers::AppState;
use crate::ApiResponse;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

pub fn toast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_toasts))
        .route("/:toast_id", delete(dismiss_toast))
}

/// Currently visible toasts, newest first, for polling clients.
async fn list_toasts(State(state): State<AppState>) -> Response {
    let toasts = state.services.toasts.active().await;
    success_response(ApiResponse::success(toasts))
}

async fn dismiss_toast(State(state): State<AppState>, Path(toast_id): Path<Uuid>) -> Response {
    state.services.toasts.dismiss(toast_id).await;
    no_content_response()
}
