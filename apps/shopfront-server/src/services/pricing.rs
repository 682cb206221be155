//! # Pricing Adapter
//!
//! Gathers everything the pricing engine needs for a session, runs it, and
//! writes back the one thing pricing may change: the stored coupon code.
//!
//! ## Per-Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session ──► (cart lines, coupon code)                                  │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  coupons.get_by_code(code) ── missing / not redeemable ──► drop code    │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  category-scoped? ── yes ──► products.refs_for(cart ids)  (one query)  │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  price_cart(lines, coupon, categories)                                  │
//! │                    │                                                    │
//! │                    ├── Rejected ──► drop code (logged at debug)         │
//! │                    ▼                                                    │
//! │  CartSummary { items, itemCount, subtotal, discount, total, couponCode }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a code never fails the request: the shopper just sees the
//! undiscounted total.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use shopfront_core::cart::CartItem;
use shopfront_core::coupon::{Coupon, CouponScope};
use shopfront_core::pricing::{category_map, price_cart, Pricing};
use shopfront_core::CoreError;
use shopfront_db::DbError;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SessionId};

/// Cart as the storefront displays it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    /// Units across all lines (the badge figure).
    pub item_count: i64,
    /// Two-decimal display strings.
    pub subtotal: String,
    pub discount: String,
    pub total: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub coupon_code: Option<String>,
}

/// Engine output plus the inputs it was computed from.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub items: Vec<CartItem>,
    pub pricing: Pricing,
    /// The code still applied after pricing, if any.
    pub coupon_code: Option<String>,
}

impl PricedCart {
    pub fn summary(&self) -> CartSummary {
        let result = &self.pricing.result;
        CartSummary {
            item_count: self.items.iter().map(|i| i.quantity).sum(),
            items: self.items.clone(),
            subtotal: result.subtotal.to_decimal_string(),
            discount: result.discount.to_decimal_string(),
            total: result.total.to_decimal_string(),
            subtotal_cents: result.subtotal.cents(),
            discount_cents: result.discount.cents(),
            total_cents: result.total.cents(),
            coupon_code: self.coupon_code.clone(),
        }
    }
}

/// Loads a coupon that is still usable now, or `None`.
///
/// A stored row that fails its own invariants is treated like a missing one
/// so a bad admin edit can't break every cart that references it.
async fn load_redeemable(state: &AppState, code: &str) -> ApiResult<Option<Coupon>> {
    let coupon = match state.db.coupons().get_by_code(code).await {
        Ok(coupon) => coupon,
        Err(DbError::InvalidRecord { reason, .. }) => {
            warn!(code = %code, reason = %reason, "Ignoring malformed coupon");
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(coupon.filter(|c| match c.check_redeemable(Utc::now()) {
        Ok(()) => true,
        Err(reason) => {
            debug!(code = %code, reason = %reason, "Coupon no longer redeemable");
            false
        }
    }))
}

/// Pre-fetches the category lookup, only when the coupon needs one.
async fn categories_for(
    state: &AppState,
    items: &[CartItem],
    coupon: Option<&Coupon>,
) -> ApiResult<HashMap<String, String>> {
    match coupon {
        Some(c) if c.applies_to == CouponScope::Categories && !items.is_empty() => {
            let ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
            let refs = state.db.products().refs_for(&ids).await?;
            Ok(category_map(refs))
        }
        _ => Ok(HashMap::new()),
    }
}

/// Prices the session cart, dropping the stored coupon when it no longer
/// applies.
pub async fn price_session(state: &AppState, session: &SessionId) -> ApiResult<PricedCart> {
    let (items, stored_code) = state
        .sessions
        .read(session, |s| (s.cart.items.clone(), s.coupon_code.clone()));

    let coupon = match &stored_code {
        Some(code) => load_redeemable(state, code).await?,
        None => None,
    };

    let categories = categories_for(state, &items, coupon.as_ref()).await?;
    let pricing = price_cart(&items, coupon.as_ref(), &categories);

    let keep = coupon.is_some() && !pricing.should_clear_coupon();
    if let (Some(code), false) = (&stored_code, keep) {
        debug!(session = %session.as_str(), code = %code, "Clearing coupon from session");
        // Only clear what we priced with; a concurrent apply wins.
        state.sessions.update(session, |s| {
            if s.coupon_code.as_ref() == Some(code) {
                s.coupon_code = None;
            }
        });
    }

    Ok(PricedCart {
        items,
        pricing,
        coupon_code: if keep { stored_code } else { None },
    })
}

/// The cart summary for a session.
pub async fn summarize(state: &AppState, session: &SessionId) -> ApiResult<CartSummary> {
    Ok(price_session(state, session).await?.summary())
}

/// Applies a coupon code to the session cart.
///
/// ## Returns
/// * `Ok(summary)` - code stored, discount reflected in the summary
/// * `Err(CartError)` - the cart is empty
/// * `Err(ValidationError)` - unknown code, not redeemable, or minimum not met;
///   nothing is stored
pub async fn apply_coupon(
    state: &AppState,
    session: &SessionId,
    code: &str,
) -> ApiResult<CartSummary> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ApiError::validation("Coupon code is required"));
    }

    let items = state.sessions.read(session, |s| s.cart.items.clone());
    if items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let coupon = match state.db.coupons().get_by_code(&code).await {
        Ok(Some(coupon)) => coupon,
        Ok(None) | Err(DbError::InvalidRecord { .. }) => {
            return Err(ApiError::validation(format!("Invalid coupon code: {}", code)))
        }
        Err(e) => return Err(e.into()),
    };

    coupon
        .check_redeemable(Utc::now())
        .map_err(|reason| CoreError::CouponNotRedeemable {
            code: code.clone(),
            reason,
        })?;

    let categories = categories_for(state, &items, Some(&coupon)).await?;
    let pricing = price_cart(&items, Some(&coupon), &categories);
    if pricing.should_clear_coupon() {
        return Err(CoreError::CouponMinimumNotMet {
            code,
            minimum: coupon.min_order.to_decimal_string(),
        }
        .into());
    }

    debug!(session = %session.as_str(), code = %code, "Coupon applied");
    state
        .sessions
        .update(session, |s| s.coupon_code = Some(code.clone()));

    Ok(PricedCart {
        items,
        pricing,
        coupon_code: Some(code),
    }
    .summary())
}

/// Removes any applied coupon.
pub async fn remove_coupon(state: &AppState, session: &SessionId) -> ApiResult<CartSummary> {
    state.sessions.update(session, |s| s.coupon_code = None);
    summarize(state, session).await
}
