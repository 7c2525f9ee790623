use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, pricing_policy, success_response};
use crate::handlers::AppState;
use crate::models::{Cart, CartItem, OrderSummary, Product};
use crate::services::toasts::ToastKind;
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

/// Creates the router for cart and wishlist endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/:session", get(get_cart).delete(clear_cart))
        .route("/:session/items", post(add_item).put(update_quantity))
        .route("/:session/items/:product_id/:size", delete(remove_item))
        .route("/:session/wishlist", get(get_wishlist))
        .route("/:session/wishlist/toggle", post(toggle_wishlist))
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub summary: OrderSummary,
}

fn cart_view(cart: Cart, state: &AppState) -> CartView {
    let summary = OrderSummary::compute(&cart.items, &pricing_policy(&state.config));
    CartView {
        item_count: cart.item_count(),
        items: cart.items,
        summary,
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product: Product,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub user_email: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: u32,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ToggleWishlistRequest {
    pub product: Product,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub added: bool,
    pub items: Vec<Product>,
}

async fn get_cart(State(state): State<AppState>, Path(session): Path<String>) -> Response {
    let cart = state.services.carts.get(&session);
    success_response(ApiResponse::success(cart_view(cart, &state)))
}

async fn add_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product_name = payload.product.name.clone();

    let cart = state
        .services
        .carts
        .add_item(
            &session,
            payload.product,
            payload.size,
            payload.quantity,
            payload.user_email,
        )
        .await
        .map_err(map_service_error)?;

    state
        .services
        .toasts
        .push(ToastKind::Success, format!("{} added to cart!", product_name))
        .await;

    Ok(success_response(ApiResponse::success(cart_view(
        cart, &state,
    ))))
}

async fn update_quantity(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .set_quantity(&session, payload.product_id, &payload.size, payload.quantity)
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(cart_view(
        cart, &state,
    ))))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((session, product_id, size)): Path<(String, u32, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .carts
        .remove_item(&session, product_id, &size)
        .map_err(map_service_error)?;

    Ok(success_response(ApiResponse::success(cart_view(
        cart, &state,
    ))))
}

async fn clear_cart(State(state): State<AppState>, Path(session): Path<String>) -> Response {
    state.services.carts.clear(&session);
    success_response(ApiResponse::success(cart_view(
        state.services.carts.get(&session),
        &state,
    )))
}

async fn get_wishlist(State(state): State<AppState>, Path(session): Path<String>) -> Response {
    let items = state.services.carts.wishlist(&session);
    success_response(ApiResponse::success(items))
}

async fn toggle_wishlist(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(payload): Json<ToggleWishlistRequest>,
) -> Response {
    let product_name = payload.product.name.clone();

    let (added, items) = state
        .services
        .carts
        .toggle_wishlist(&session, payload.product, payload.user_email)
        .await;

    let message = if added {
        format!("{} added to wishlist!", product_name)
    } else {
        format!("{} removed from wishlist", product_name)
    };
    state.services.toasts.push(ToastKind::Success, message).await;

    success_response(ApiResponse::success(WishlistView { added, items }))
}
