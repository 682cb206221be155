//! # Checkout Routes
//!
//! ```text
//! POST /api/checkout/details        save contact details for the order
//! POST /api/orders                  create the provider order
//! POST /api/orders/{id}/capture     capture it and record the Order
//! GET  /checkout/success            provider return page
//! GET  /checkout/cancel             provider cancel page
//! ```

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use shopfront_core::ShippingAddress;

use crate::error::ApiResult;
use crate::services::checkout::{self, CaptureOutcome, CreatedOrder};
use crate::state::{AppState, SessionId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/details", post(save_details))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}/capture", post(capture_order))
        .route("/checkout/success", get(success_page))
        .route("/checkout/cancel", get(cancel_page))
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

async fn save_details(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(details): Json<ShippingAddress>,
) -> ApiResult<Json<Ack>> {
    checkout::save_customer_details(&state, &session, details)?;
    Ok(Json(Ack {
        message: "Customer details saved to session.",
    }))
}

async fn create_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult<Json<CreatedOrder>> {
    Ok(Json(checkout::create_order(&state, &session).await?))
}

async fn capture_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<CaptureOutcome>> {
    Ok(Json(checkout::capture_order(&state, &session, &order_id).await?))
}

async fn success_page() -> Html<&'static str> {
    Html("<h1>Payment Successful!</h1><p>Thank you for your purchase.</p><a href=\"/\">Go Home</a>")
}

async fn cancel_page() -> Html<&'static str> {
    Html("<h1>Payment Cancelled</h1><p>Your payment was cancelled. Please try again.</p><a href=\"/\">Go Home</a>")
}
