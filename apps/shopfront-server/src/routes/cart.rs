//! # Cart Routes
//!
//! Session cart manipulation. Every route answers with the freshly priced
//! [`CartSummary`].
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│ Captured │       │
//! │  │  Cart    │     │ (+coupon)│     │ pending  │     │  Order   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                  │             │
//! │                   cart/add                                │             │
//! │                   cart/update                             │             │
//! │                   cart/remove                             │             │
//! │                   cart/coupon                             │             │
//! │                        │                                  │             │
//! │                        ▼                                  ▼             │
//! │                   cart/clear ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::pricing::{self, CartSummary};
use crate::state::{AppState, SessionId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", post(update_cart_item))
        .route("/api/cart/remove", post(remove_from_cart))
        .route("/api/cart/clear", post(clear_cart))
        .route("/api/cart/coupon", post(apply_coupon).delete(remove_coupon))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItem {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItem {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCoupon {
    pub code: String,
}

async fn get_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult<Json<CartSummary>> {
    Ok(Json(pricing::summarize(&state, &session).await?))
}

/// Adds a product, freezing its current price.
///
/// ## Behavior
/// - Product already in cart: quantity increases, original price kept
/// - Product not in cart: appended
/// - Quantity defaults to 1
async fn add_to_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<AddToCart>,
) -> ApiResult<Json<CartSummary>> {
    let quantity = body.quantity.unwrap_or(1);
    debug!(product_id = %body.product_id, quantity, "add_to_cart");

    let product = state
        .db
        .products()
        .get_by_id(&body.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &body.product_id))?;

    state
        .sessions
        .update(&session, |s| s.cart.add_item(&product, quantity))?;

    Ok(Json(pricing::summarize(&state, &session).await?))
}

/// Sets a line's quantity. Zero or below removes the line.
async fn update_cart_item(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<UpdateCartItem>,
) -> ApiResult<Json<CartSummary>> {
    debug!(product_id = %body.product_id, quantity = body.quantity, "update_cart_item");

    state
        .sessions
        .update(&session, |s| s.cart.update_quantity(&body.product_id, body.quantity))?;

    Ok(Json(pricing::summarize(&state, &session).await?))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<RemoveCartItem>,
) -> ApiResult<Json<CartSummary>> {
    debug!(product_id = %body.product_id, "remove_from_cart");

    state
        .sessions
        .update(&session, |s| s.cart.remove_item(&body.product_id))?;

    Ok(Json(pricing::summarize(&state, &session).await?))
}

/// Empties the cart and drops any applied coupon.
async fn clear_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult<Json<CartSummary>> {
    state.sessions.update(&session, |s| {
        s.cart.clear();
        s.coupon_code = None;
    });

    Ok(Json(pricing::summarize(&state, &session).await?))
}

async fn apply_coupon(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<ApplyCoupon>,
) -> ApiResult<Json<CartSummary>> {
    Ok(Json(pricing::apply_coupon(&state, &session, &body.code).await?))
}

async fn remove_coupon(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult<Json<CartSummary>> {
    Ok(Json(pricing::remove_coupon(&state, &session).await?))
}
