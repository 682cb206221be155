//! # Coupons
//!
//! Coupon definitions and the rules that decide whether a coupon can be
//! used at all.
//!
//! ## Coupon Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Admin form / DB row                                                    │
//! │  (CouponDraft: strings + decimals)                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  validate_coupon() ──── unknown type, negative value ──► ValidationError│
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Coupon (typed: Discount, CouponScope, Money)                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  check_redeemable(now) ── inactive / expired / used up ──► rejection    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  pricing::price_cart() ── eligibility, min order, clamp                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything that can be wrong with the coupon *itself* is caught before
//! pricing runs. Pricing never fails.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::cart::CartItem;
use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::CategoryLookup;
use crate::types::Percentage;
use crate::validation::{validate_coupon_code, ValidationResult};

// =============================================================================
// Discount
// =============================================================================

/// How much a coupon takes off its eligible subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
#[ts(export)]
pub enum Discount {
    /// A rate of the eligible subtotal.
    Percentage(Percentage),
    /// A flat amount, capped at the eligible subtotal.
    Fixed(Money),
}

impl Discount {
    /// Storage tag: `"percentage"` or `"fixed"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Discount::Percentage(_) => "percentage",
            Discount::Fixed(_) => "fixed",
        }
    }

    /// Storage value: basis points for percentages, cents for fixed amounts.
    pub fn stored_value(&self) -> i64 {
        match self {
            Discount::Percentage(rate) => rate.bps() as i64,
            Discount::Fixed(amount) => amount.cents(),
        }
    }

    /// Rebuilds a discount from its storage form.
    pub fn from_stored(kind: &str, value: i64) -> ValidationResult<Self> {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: "discountValue".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        match kind {
            "percentage" => u32::try_from(value)
                .map(|bps| Discount::Percentage(Percentage::from_bps(bps)))
                .map_err(|_| ValidationError::OutOfRange {
                    field: "discountValue".to_string(),
                    min: 0,
                    max: u32::MAX as i64,
                }),
            "fixed" => Ok(Discount::Fixed(Money::from_cents(value))),
            _ => Err(discount_type_not_allowed()),
        }
    }

    /// The discount before clamping to the eligible subtotal.
    pub fn raw_amount(&self, eligible_subtotal: Money) -> Money {
        match self {
            Discount::Percentage(rate) => eligible_subtotal.percentage_of(*rate),
            Discount::Fixed(amount) => *amount,
        }
    }
}

fn discount_type_not_allowed() -> ValidationError {
    ValidationError::NotAllowed {
        field: "discountType".to_string(),
        allowed: vec!["percentage".to_string(), "fixed".to_string()],
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Which cart lines a coupon applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CouponScope {
    /// Every line.
    All,
    /// Lines whose product id is in `target_product_ids`.
    Products,
    /// Lines whose product category is in `target_category_names`.
    Categories,
}

impl CouponScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponScope::All => "all",
            CouponScope::Products => "products",
            CouponScope::Categories => "categories",
        }
    }
}

impl Default for CouponScope {
    fn default() -> Self {
        CouponScope::All
    }
}

impl FromStr for CouponScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(CouponScope::All),
            "products" => Ok(CouponScope::Products),
            "categories" => Ok(CouponScope::Categories),
            _ => Err(ValidationError::NotAllowed {
                field: "appliesTo".to_string(),
                allowed: vec![
                    "all".to_string(),
                    "products".to_string(),
                    "categories".to_string(),
                ],
            }),
        }
    }
}

impl fmt::Display for CouponScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A validated coupon.
///
/// ## Invariants
/// - `code` is trimmed, upper-case and non-empty
/// - `min_order` is ≥ 0
/// - `usage_limit` is −1 (unlimited) or ≥ 0
/// - target lists hold no blanks and no duplicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Coupon {
    pub code: String,
    pub discount: Discount,
    /// Eligible subtotal required before the discount applies.
    pub min_order: Money,
    pub applies_to: CouponScope,
    pub target_product_ids: Vec<String>,
    pub target_category_names: Vec<String>,
    /// −1 means unlimited.
    pub usage_limit: i64,
    pub used_count: i64,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why an otherwise valid coupon can't be redeemed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    #[error("coupon is inactive")]
    Inactive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
}

impl Coupon {
    /// Checks the coupon's own invariants. Called on every load so a bad
    /// row never reaches the pricing engine.
    pub fn check_invariants(&self) -> ValidationResult<()> {
        validate_coupon_code(&self.code)?;
        if self.code != self.code.trim().to_uppercase() {
            return Err(ValidationError::InvalidFormat {
                field: "code".to_string(),
                reason: "must be upper-case".to_string(),
            });
        }
        if self.min_order.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "minOrderAmount".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if let Discount::Fixed(amount) = self.discount {
            if amount.is_negative() {
                return Err(ValidationError::OutOfRange {
                    field: "discountValue".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
        if self.usage_limit < -1 {
            return Err(ValidationError::OutOfRange {
                field: "usageLimit".to_string(),
                min: -1,
                max: i64::MAX,
            });
        }
        if self.used_count < 0 {
            return Err(ValidationError::OutOfRange {
                field: "usedCount".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        Ok(())
    }

    /// Whether the coupon may be redeemed at `now`.
    ///
    /// ## Order of Checks
    /// inactive → expired → usage limit. The first failing check wins.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if matches!(self.expires_at, Some(expires) if expires <= now) {
            return Err(CouponRejection::Expired);
        }
        if self.usage_limit >= 0 && self.used_count >= self.usage_limit {
            return Err(CouponRejection::UsageLimitReached);
        }
        Ok(())
    }

    /// Per-line eligibility.
    ///
    /// A category-scoped coupon treats a product with no known category as
    /// ineligible.
    pub fn is_eligible<L>(&self, item: &CartItem, categories: &L) -> bool
    where
        L: CategoryLookup + ?Sized,
    {
        match self.applies_to {
            CouponScope::All => true,
            CouponScope::Products => self
                .target_product_ids
                .iter()
                .any(|id| *id == item.product_id),
            CouponScope::Categories => categories
                .category_of(&item.product_id)
                .map(|category| self.target_category_names.iter().any(|n| n == category))
                .unwrap_or(false),
        }
    }
}

// =============================================================================
// Draft (unvalidated input)
// =============================================================================

/// Raw coupon input as it arrives from the admin API or seed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CouponDraft {
    pub code: String,
    /// `"percentage"` or `"fixed"`.
    pub discount_type: String,
    /// Percent (10 = 10%) or currency amount (5.5 = 5.50).
    pub discount_value: f64,
    pub min_order_amount: f64,
    /// `"all"`, `"products"` or `"categories"`.
    pub applies_to: String,
    pub target_product_ids: Vec<String>,
    pub target_category_names: Vec<String>,
    pub usage_limit: i64,
    pub used_count: i64,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for CouponDraft {
    fn default() -> Self {
        CouponDraft {
            code: String::new(),
            discount_type: "percentage".to_string(),
            discount_value: 0.0,
            min_order_amount: 0.0,
            applies_to: "all".to_string(),
            target_product_ids: Vec::new(),
            target_category_names: Vec::new(),
            usage_limit: -1,
            used_count: 0,
            is_active: true,
            expires_at: None,
        }
    }
}

/// Validates a draft into a [`Coupon`].
///
/// ## Rules
/// - code: trimmed, upper-cased, 1-32 letters/digits/`-`/`_`
/// - discountType: `percentage` or `fixed` (case-insensitive)
/// - discountValue, minOrderAmount: finite and ≥ 0
/// - appliesTo: `all`, `products` or `categories`
/// - usageLimit ≥ −1, usedCount ≥ 0
/// - target lists: trimmed, blanks and duplicates dropped
///
/// ## Example
/// ```rust
/// use shopfront_core::coupon::{validate_coupon, CouponDraft, Discount};
/// use shopfront_core::types::Percentage;
///
/// let coupon = validate_coupon(CouponDraft {
///     code: " welcome10 ".into(),
///     discount_type: "percentage".into(),
///     discount_value: 10.0,
///     ..CouponDraft::default()
/// })
/// .unwrap();
///
/// assert_eq!(coupon.code, "WELCOME10");
/// assert_eq!(coupon.discount, Discount::Percentage(Percentage::from_bps(1000)));
///
/// let bad = CouponDraft { code: "X".into(), discount_type: "bogus".into(), ..CouponDraft::default() };
/// assert!(validate_coupon(bad).is_err());
/// ```
pub fn validate_coupon(draft: CouponDraft) -> ValidationResult<Coupon> {
    let code = draft.code.trim().to_uppercase();
    validate_coupon_code(&code)?;

    if !draft.discount_value.is_finite() || draft.discount_value < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "discountValue".to_string(),
            reason: "must be a non-negative number".to_string(),
        });
    }

    let discount = match draft.discount_type.trim().to_ascii_lowercase().as_str() {
        "percentage" => Percentage::from_percentage(draft.discount_value)
            .map(Discount::Percentage)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "discountValue".to_string(),
                reason: "percentage is out of range".to_string(),
            })?,
        "fixed" => Money::from_decimal(draft.discount_value)
            .map(Discount::Fixed)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "discountValue".to_string(),
                reason: "amount is out of range".to_string(),
            })?,
        _ => return Err(discount_type_not_allowed()),
    };

    if !draft.min_order_amount.is_finite() || draft.min_order_amount < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "minOrderAmount".to_string(),
            reason: "must be a non-negative number".to_string(),
        });
    }
    let min_order = Money::from_decimal(draft.min_order_amount).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: "minOrderAmount".to_string(),
            reason: "amount is out of range".to_string(),
        }
    })?;

    let coupon = Coupon {
        code,
        discount,
        min_order,
        applies_to: draft.applies_to.parse()?,
        target_product_ids: normalize_targets(draft.target_product_ids),
        target_category_names: normalize_targets(draft.target_category_names),
        usage_limit: draft.usage_limit,
        used_count: draft.used_count,
        is_active: draft.is_active,
        expires_at: draft.expires_at,
    };
    coupon.check_invariants()?;
    Ok(coupon)
}

/// Trims entries, drops blanks and duplicates, keeps first-seen order.
pub fn normalize_targets(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;

    fn draft(code: &str, kind: &str, value: f64) -> CouponDraft {
        CouponDraft {
            code: code.to_string(),
            discount_type: kind.to_string(),
            discount_value: value,
            ..CouponDraft::default()
        }
    }

    fn item(product_id: &str) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            image: None,
            unit_price_cents: 1000,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_percentage_coupon() {
        let coupon = validate_coupon(draft("save10", "percentage", 10.0)).unwrap();
        assert_eq!(coupon.code, "SAVE10");
        assert_eq!(coupon.discount, Discount::Percentage(Percentage::from_bps(1000)));
        assert_eq!(coupon.applies_to, CouponScope::All);
        assert_eq!(coupon.usage_limit, -1);
        assert!(coupon.is_active);
    }

    #[test]
    fn test_validate_fixed_coupon() {
        let mut d = draft("FLAT5", "Fixed", 5.5);
        d.min_order_amount = 20.0;
        let coupon = validate_coupon(d).unwrap();
        assert_eq!(coupon.discount, Discount::Fixed(Money::from_cents(550)));
        assert_eq!(coupon.min_order, Money::from_cents(2000));
    }

    #[test]
    fn test_validate_rejects_unknown_discount_type() {
        let err = validate_coupon(draft("X1", "bogo", 1.0)).unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { field, .. } if field == "discountType"));
    }

    #[test]
    fn test_validate_rejects_negative_or_non_finite_value() {
        assert!(validate_coupon(draft("X1", "fixed", -1.0)).is_err());
        assert!(validate_coupon(draft("X1", "percentage", f64::NAN)).is_err());
        assert!(validate_coupon(draft("X1", "fixed", f64::INFINITY)).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_min_order() {
        let mut d = draft("X1", "fixed", 1.0);
        d.min_order_amount = -0.01;
        assert!(validate_coupon(d).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_code_and_scope() {
        assert!(validate_coupon(draft("   ", "fixed", 1.0)).is_err());
        assert!(validate_coupon(draft("has space", "fixed", 1.0)).is_err());

        let mut d = draft("X1", "fixed", 1.0);
        d.applies_to = "brands".to_string();
        assert!(validate_coupon(d).is_err());

        let mut d = draft("X1", "fixed", 1.0);
        d.usage_limit = -2;
        assert!(validate_coupon(d).is_err());
    }

    #[test]
    fn test_validate_normalizes_targets() {
        let mut d = draft("CAT", "percentage", 5.0);
        d.applies_to = "Categories".to_string();
        d.target_category_names = vec![
            " Antivirus ".to_string(),
            "VPN".to_string(),
            "".to_string(),
            "Antivirus".to_string(),
        ];
        let coupon = validate_coupon(d).unwrap();
        assert_eq!(coupon.applies_to, CouponScope::Categories);
        assert_eq!(coupon.target_category_names, vec!["Antivirus", "VPN"]);
    }

    #[test]
    fn test_discount_storage_round_trip_rejects_garbage() {
        let d = Discount::Percentage(Percentage::from_bps(1250));
        assert_eq!(Discount::from_stored(d.kind(), d.stored_value()).unwrap(), d);
        assert!(Discount::from_stored("fixed", -5).is_err());
        assert!(Discount::from_stored("bogus", 5).is_err());
    }

    #[test]
    fn test_check_redeemable() {
        let now = Utc::now();
        let mut coupon = validate_coupon(draft("OK", "fixed", 1.0)).unwrap();
        assert_eq!(coupon.check_redeemable(now), Ok(()));

        coupon.expires_at = Some(now + Duration::days(1));
        assert_eq!(coupon.check_redeemable(now), Ok(()));

        coupon.expires_at = Some(now - Duration::seconds(1));
        assert_eq!(coupon.check_redeemable(now), Err(CouponRejection::Expired));

        coupon.expires_at = None;
        coupon.usage_limit = 3;
        coupon.used_count = 3;
        assert_eq!(
            coupon.check_redeemable(now),
            Err(CouponRejection::UsageLimitReached)
        );

        coupon.usage_limit = -1;
        coupon.used_count = 10_000;
        assert_eq!(coupon.check_redeemable(now), Ok(()));

        coupon.is_active = false;
        assert_eq!(coupon.check_redeemable(now), Err(CouponRejection::Inactive));
    }

    #[test]
    fn test_eligibility_by_scope() {
        let mut categories = HashMap::new();
        categories.insert("p1".to_string(), "Antivirus".to_string());
        categories.insert("p2".to_string(), "VPN".to_string());

        let all = validate_coupon(draft("ALL", "fixed", 1.0)).unwrap();
        assert!(all.is_eligible(&item("anything"), &categories));

        let mut d = draft("PROD", "fixed", 1.0);
        d.applies_to = "products".to_string();
        d.target_product_ids = vec!["p1".to_string()];
        let products = validate_coupon(d).unwrap();
        assert!(products.is_eligible(&item("p1"), &categories));
        assert!(!products.is_eligible(&item("p2"), &categories));

        let mut d = draft("CAT", "fixed", 1.0);
        d.applies_to = "categories".to_string();
        d.target_category_names = vec!["Antivirus".to_string()];
        let by_category = validate_coupon(d).unwrap();
        assert!(by_category.is_eligible(&item("p1"), &categories));
        assert!(!by_category.is_eligible(&item("p2"), &categories));
        // Unknown product: no category, not eligible
        assert!(!by_category.is_eligible(&item("p404"), &categories));
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let d: CouponDraft =
            serde_json::from_str(r#"{"code":"spring","discountType":"fixed","discountValue":3}"#)
                .unwrap();
        assert_eq!(d.usage_limit, -1);
        assert!(d.is_active);
        assert_eq!(d.applies_to, "all");
    }
}
