//! # Checkout Service
//!
//! Turns a priced session cart into a payment provider order, and a captured
//! payment into a persisted [`Order`].
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_customer_details ──► session.customer                            │
//! │                                                                         │
//! │  create_order                                                           │
//! │    cart empty or total 0.00? ──► CartError                             │
//! │    price_session ──► gateway.create_order(total) ──► provider order id │
//! │    session.pending_checkout = snapshot                                 │
//! │                                                                         │
//! │  (shopper approves with the provider)                                  │
//! │                                                                         │
//! │  capture_order(id)                                                      │
//! │    id ≠ pending id ──► ValidationError (nothing captured)              │
//! │    gateway.capture_order ──► Order { status, payer, amount, items }    │
//! │    orders.insert (increments the coupon's usedCount)                   │
//! │    duplicate provider id ──► Conflict                                  │
//! │    session.settle_purchase(snapshot items)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use shopfront_core::validation::validate_email;
use shopfront_core::{
    CoreError, Order, OrderItem, OrderStatus, ShippingAddress, GUEST_EMAIL, GUEST_NAME,
};
use shopfront_db::DbError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::payment::{PaymentLine, PaymentRequest};
use crate::services::pricing::{price_session, CartSummary};
use crate::state::{AppState, PendingCheckout, SessionId};

/// Response to `POST /api/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    /// Provider order id the storefront hands to the payment widget.
    pub id: String,
    pub status: String,
    pub summary: CartSummary,
}

/// Response to `POST /api/orders/{id}/capture`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub order: Order,
    /// The provider's capture payload.
    pub capture: Value,
}

/// Stores the customer's contact details for the coming order.
///
/// All fields are free text; a non-empty email must be well formed.
pub fn save_customer_details(
    state: &AppState,
    session: &SessionId,
    mut details: ShippingAddress,
) -> ApiResult<()> {
    details.full_name = details.full_name.trim().to_string();
    if !details.email.trim().is_empty() {
        details.email = validate_email(&details.email)?;
    }

    state
        .sessions
        .update(session, |s| s.customer = Some(details));
    Ok(())
}

/// Creates a provider order for the session cart.
pub async fn create_order(state: &AppState, session: &SessionId) -> ApiResult<CreatedOrder> {
    let priced = price_session(state, session).await?;
    if priced.items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let result = priced.pricing.result;
    if !result.total.is_positive() {
        return Err(ApiError::cart(
            "Order total must be greater than zero to pay online",
        ));
    }

    let currency = state.db.settings().load().await?.currency;

    let request = PaymentRequest {
        currency: currency.clone(),
        lines: priced
            .items
            .iter()
            .map(|item| PaymentLine {
                name: item.name.clone(),
                unit_amount: item.unit_price(),
                quantity: item.quantity,
            })
            .collect(),
        item_total: result.subtotal,
        discount: result.discount,
        total: result.total,
        return_url: format!("{}/checkout/success", state.config.public_url),
        cancel_url: format!("{}/checkout/cancel", state.config.public_url),
    };

    let created = state.gateway.create_order(&request).await?;

    let pending = PendingCheckout {
        payment_order_id: created.order_id.clone(),
        items: priced.items.clone(),
        pricing: result,
        coupon_code: priced.coupon_code.clone(),
        currency,
    };
    state
        .sessions
        .update(session, |s| s.pending_checkout = Some(pending));

    info!(
        session = %session.as_str(),
        order_id = %created.order_id,
        total = %result.total,
        "Checkout started"
    );

    Ok(CreatedOrder {
        id: created.order_id,
        status: created.status,
        summary: priced.summary(),
    })
}

/// Captures the pending provider order and records it.
pub async fn capture_order(
    state: &AppState,
    session: &SessionId,
    payment_order_id: &str,
) -> ApiResult<CaptureOutcome> {
    let (pending, customer, user) = state.sessions.read(session, |s| {
        (
            s.pending_checkout.clone(),
            s.customer.clone(),
            s.user.clone(),
        )
    });

    let pending = match pending {
        Some(p) if p.payment_order_id == payment_order_id => p,
        _ => {
            warn!(
                session = %session.as_str(),
                order_id = %payment_order_id,
                "Capture for an order this session didn't start"
            );
            return Err(ApiError::validation("No matching checkout in progress"));
        }
    };

    let captured = state.gateway.capture_order(payment_order_id).await?;

    if captured.amount != pending.pricing.total {
        warn!(
            order_id = %payment_order_id,
            expected = %pending.pricing.total,
            captured = %captured.amount,
            "Captured amount differs from the priced total"
        );
    }

    let details = customer.unwrap_or_default();
    let customer_name = Some(details.full_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            user.as_ref().map(|u| {
                if u.full_name.trim().is_empty() {
                    u.username.clone()
                } else {
                    u.full_name.clone()
                }
            })
        })
        .unwrap_or_else(|| GUEST_NAME.to_string());
    let customer_email = Some(details.email.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .or_else(|| user.as_ref().map(|u| u.email.clone()))
        .unwrap_or_else(|| GUEST_EMAIL.to_string());

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.as_ref().map(|u| u.id.clone()),
        customer_name,
        customer_email,
        payment_order_id: captured.order_id.clone(),
        payer_id: captured.payer_id.clone(),
        status: OrderStatus::from_provider(&captured.status),
        subtotal_cents: pending.pricing.subtotal.cents(),
        discount_cents: pending.pricing.discount.cents(),
        total_cents: captured.amount.cents(),
        currency: captured.currency.clone(),
        coupon_code: pending.coupon_code.clone(),
        items: pending
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                price_cents: item.unit_price_cents,
                quantity: item.quantity,
                image: item.image.clone(),
            })
            .collect(),
        shipping_address: details,
        created_at: Utc::now(),
    };

    match state.db.orders().insert(&order).await {
        Ok(()) => {}
        Err(DbError::UniqueViolation { .. }) => {
            return Err(ApiError::conflict(format!(
                "Order {} was already recorded",
                payment_order_id
            )))
        }
        Err(e) => return Err(e.into()),
    }

    state
        .sessions
        .update(session, |s| s.settle_purchase(&pending.items));

    info!(
        order = %order.id,
        payment_order_id = %order.payment_order_id,
        status = ?order.status,
        total = %order.total(),
        "Order recorded"
    );

    Ok(CaptureOutcome {
        order,
        capture: captured.raw,
    })
}
