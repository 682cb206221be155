//! # Cart Pricing Engine
//!
//! Turns cart lines plus an optional coupon into subtotal, discount and
//! total. Pure and synchronous: every input is passed in, nothing is read
//! or written elsewhere.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items ──► subtotal = Σ unit_price × qty                                │
//! │              │                                                          │
//! │              ├── empty cart or no coupon ──► discount 0  (NotApplied)   │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  per line: coupon.is_eligible(line, categories)                         │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  eligible = Σ eligible line totals                                      │
//! │              │                                                          │
//! │              ├── eligible < min_order ──► discount 0  (Rejected)        │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  raw = eligible × rate   |   flat amount                                │
//! │  discount = min(raw, eligible)                          (Applied)       │
//! │  total = subtotal − discount                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! For every result: `0 ≤ discount ≤ eligible_subtotal ≤ subtotal` and
//! `total = subtotal − discount`. Amounts are whole cents throughout; the
//! percentage product is the only rounding step.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::coupon::Coupon;
use crate::money::Money;
use crate::types::ProductRef;

// =============================================================================
// Category Lookup
// =============================================================================

/// Resolves a product id to its category name.
///
/// The engine calls this once per line for category-scoped coupons, so
/// callers pre-fetch the categories into memory instead of querying per
/// line. An absent category makes the line ineligible.
pub trait CategoryLookup {
    fn category_of(&self, product_id: &str) -> Option<&str>;
}

impl<S: BuildHasher> CategoryLookup for HashMap<String, String, S> {
    fn category_of(&self, product_id: &str) -> Option<&str> {
        self.get(product_id).map(String::as_str)
    }
}

impl CategoryLookup for BTreeMap<String, String> {
    fn category_of(&self, product_id: &str) -> Option<&str> {
        self.get(product_id).map(String::as_str)
    }
}

impl CategoryLookup for [ProductRef] {
    fn category_of(&self, product_id: &str) -> Option<&str> {
        self.iter()
            .find(|r| r.product_id == product_id)
            .map(|r| r.category.as_str())
    }
}

/// Builds a lookup map from catalog references.
pub fn category_map<I>(refs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = ProductRef>,
{
    refs.into_iter()
        .map(|r| (r.product_id, r.category))
        .collect()
}

// =============================================================================
// Results
// =============================================================================

/// Cart totals produced by [`price_cart`]. Recomputed on every request and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingResult {
    pub subtotal: Money,
    pub eligible_subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl PricingResult {
    fn undiscounted(subtotal: Money) -> Self {
        PricingResult {
            subtotal,
            eligible_subtotal: Money::zero(),
            discount: Money::zero(),
            total: subtotal,
        }
    }
}

/// What happened to the coupon during pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CouponOutcome {
    /// No coupon, or the cart is empty.
    NotApplied,
    /// The coupon was applied (the discount may still be zero).
    Applied,
    /// The eligible subtotal is below the coupon's minimum order amount.
    /// The caller must drop its stored coupon reference.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub result: PricingResult,
    pub coupon: CouponOutcome,
}

impl Pricing {
    /// The "clear coupon" signal.
    pub fn should_clear_coupon(&self) -> bool {
        self.coupon == CouponOutcome::Rejected
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Prices a cart.
///
/// `coupon` must already have passed [`Coupon::check_redeemable`]; this
/// function only applies eligibility, the minimum order and the clamp.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use shopfront_core::cart::Cart;
/// use shopfront_core::coupon::{validate_coupon, CouponDraft};
/// use shopfront_core::pricing::{price_cart, CouponOutcome};
/// use shopfront_core::Money;
///
/// let mut cart = Cart::new();
/// cart.add_line("p1", "Suite", None, Money::from_cents(10000), 1).unwrap();
///
/// let coupon = validate_coupon(CouponDraft {
///     code: "BIG".into(),
///     discount_type: "fixed".into(),
///     discount_value: 200.0,
///     applies_to: "products".into(),
///     target_product_ids: vec!["p1".into()],
///     ..CouponDraft::default()
/// })
/// .unwrap();
///
/// let pricing = price_cart(&cart.items, Some(&coupon), &HashMap::<String, String>::new());
/// assert_eq!(pricing.coupon, CouponOutcome::Applied);
/// assert_eq!(pricing.result.discount, Money::from_cents(10000));
/// assert_eq!(pricing.result.total, Money::zero());
/// ```
pub fn price_cart<L>(items: &[CartItem], coupon: Option<&Coupon>, categories: &L) -> Pricing
where
    L: CategoryLookup + ?Sized,
{
    let subtotal: Money = items.iter().map(CartItem::line_total).sum();

    let coupon = match coupon {
        Some(coupon) if !items.is_empty() => coupon,
        _ => {
            return Pricing {
                result: PricingResult::undiscounted(subtotal),
                coupon: CouponOutcome::NotApplied,
            }
        }
    };

    let eligible_subtotal: Money = items
        .iter()
        .filter(|item| coupon.is_eligible(item, categories))
        .map(CartItem::line_total)
        .sum();

    if eligible_subtotal < coupon.min_order {
        return Pricing {
            result: PricingResult {
                eligible_subtotal,
                ..PricingResult::undiscounted(subtotal)
            },
            coupon: CouponOutcome::Rejected,
        };
    }

    let discount = coupon
        .discount
        .raw_amount(eligible_subtotal)
        .min(eligible_subtotal)
        .max(Money::zero());

    Pricing {
        result: PricingResult {
            subtotal,
            eligible_subtotal,
            discount,
            total: subtotal - discount,
        },
        coupon: CouponOutcome::Applied,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::{validate_coupon, CouponDraft};
    use chrono::Utc;

    fn line(product_id: &str, unit_price_cents: i64, quantity: i64) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            image: None,
            unit_price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    fn coupon(kind: &str, value: f64, min_order: f64) -> Coupon {
        validate_coupon(CouponDraft {
            code: "TEST".to_string(),
            discount_type: kind.to_string(),
            discount_value: value,
            min_order_amount: min_order,
            ..CouponDraft::default()
        })
        .unwrap()
    }

    fn scoped(mut base: Coupon, scope: &str, targets: &[&str]) -> Coupon {
        let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        match scope {
            "products" => {
                base.applies_to = crate::coupon::CouponScope::Products;
                base.target_product_ids = targets;
            }
            "categories" => {
                base.applies_to = crate::coupon::CouponScope::Categories;
                base.target_category_names = targets;
            }
            _ => unreachable!(),
        }
        base
    }

    fn no_categories() -> HashMap<String, String> {
        HashMap::new()
    }

    fn assert_invariants(p: &Pricing) {
        let r = p.result;
        assert!(r.discount >= Money::zero(), "discount negative: {:?}", r);
        assert!(r.discount <= r.eligible_subtotal, "discount > eligible: {:?}", r);
        assert!(r.eligible_subtotal <= r.subtotal, "eligible > subtotal: {:?}", r);
        assert_eq!(r.total, r.subtotal - r.discount);
    }

    #[test]
    fn test_percentage_coupon_on_all_items() {
        let items = vec![line("a", 3000, 1), line("b", 2000, 1)];
        let c = coupon("percentage", 10.0, 10.0);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.coupon, CouponOutcome::Applied);
        assert_eq!(p.result.subtotal, Money::from_cents(5000));
        assert_eq!(p.result.eligible_subtotal, Money::from_cents(5000));
        assert_eq!(p.result.discount, Money::from_cents(500));
        assert_eq!(p.result.total, Money::from_cents(4500));
        assert_eq!(p.result.total.to_decimal_string(), "45.00");
        assert!(!p.should_clear_coupon());
    }

    #[test]
    fn test_fixed_coupon_clamped_to_eligible_subtotal() {
        let items = vec![line("p1", 10000, 1)];
        let c = scoped(coupon("fixed", 200.0, 0.0), "products", &["p1"]);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.result.eligible_subtotal, Money::from_cents(10000));
        assert_eq!(p.result.discount, Money::from_cents(10000));
        assert_eq!(p.result.total, Money::zero());
        assert_invariants(&p);
    }

    #[test]
    fn test_category_coupon_on_other_category_gives_no_discount() {
        let items = vec![line("p2", 1000, 1)];
        let c = scoped(coupon("percentage", 50.0, 0.0), "categories", &["Antivirus"]);
        let mut categories = HashMap::new();
        categories.insert("p2".to_string(), "VPN".to_string());

        let p = price_cart(&items, Some(&c), &categories);

        assert_eq!(p.result.eligible_subtotal, Money::zero());
        assert_eq!(p.result.discount, Money::zero());
        assert_eq!(p.result.total, Money::from_cents(1000));
        assert_eq!(p.coupon, CouponOutcome::Applied);
    }

    #[test]
    fn test_category_coupon_only_discounts_matching_lines() {
        let items = vec![line("p1", 4000, 2), line("p2", 1000, 1)];
        let c = scoped(coupon("percentage", 25.0, 0.0), "categories", &["Antivirus"]);
        let categories = category_map(vec![
            ProductRef {
                product_id: "p1".to_string(),
                category: "Antivirus".to_string(),
            },
            ProductRef {
                product_id: "p2".to_string(),
                category: "VPN".to_string(),
            },
        ]);

        let p = price_cart(&items, Some(&c), &categories);

        assert_eq!(p.result.subtotal, Money::from_cents(9000));
        assert_eq!(p.result.eligible_subtotal, Money::from_cents(8000));
        assert_eq!(p.result.discount, Money::from_cents(2000));
        assert_eq!(p.result.total, Money::from_cents(7000));
    }

    #[test]
    fn test_missing_category_is_ineligible_not_an_error() {
        let items = vec![line("ghost", 1000, 1)];
        let c = scoped(coupon("fixed", 5.0, 0.0), "categories", &["Antivirus"]);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.result.eligible_subtotal, Money::zero());
        assert_eq!(p.result.discount, Money::zero());
    }

    #[test]
    fn test_slice_lookup() {
        let refs = vec![ProductRef {
            product_id: "p1".to_string(),
            category: "Antivirus".to_string(),
        }];
        let items = vec![line("p1", 1000, 1)];
        let c = scoped(coupon("fixed", 3.0, 0.0), "categories", &["Antivirus"]);

        let p = price_cart(&items, Some(&c), refs.as_slice());
        assert_eq!(p.result.discount, Money::from_cents(300));
    }

    #[test]
    fn test_minimum_order_not_met_signals_clear() {
        let items = vec![line("a", 500, 1)];
        let c = coupon("fixed", 2.0, 10.0);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.coupon, CouponOutcome::Rejected);
        assert!(p.should_clear_coupon());
        assert_eq!(p.result.discount, Money::zero());
        assert_eq!(p.result.total, Money::from_cents(500));
        assert_invariants(&p);
    }

    #[test]
    fn test_minimum_order_compares_eligible_not_full_subtotal() {
        // Cart is 60.00 but only 20.00 of it is eligible; min is 30.00
        let items = vec![line("p1", 2000, 1), line("p2", 4000, 1)];
        let c = scoped(coupon("fixed", 5.0, 30.0), "products", &["p1"]);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.coupon, CouponOutcome::Rejected);
        assert_eq!(p.result.eligible_subtotal, Money::from_cents(2000));
        assert_eq!(p.result.total, Money::from_cents(6000));
    }

    #[test]
    fn test_minimum_order_is_inclusive() {
        let items = vec![line("a", 1000, 1)];
        let c = coupon("fixed", 1.0, 10.0);

        let p = price_cart(&items, Some(&c), &no_categories());
        assert_eq!(p.coupon, CouponOutcome::Applied);
        assert_eq!(p.result.total, Money::from_cents(900));
    }

    #[test]
    fn test_empty_cart_ignores_coupon() {
        let c = coupon("fixed", 5.0, 100.0);

        let p = price_cart(&[], Some(&c), &no_categories());

        assert_eq!(p.coupon, CouponOutcome::NotApplied);
        assert!(!p.should_clear_coupon());
        assert_eq!(p.result, PricingResult::default());
    }

    #[test]
    fn test_no_coupon() {
        let items = vec![line("a", 999, 3)];

        let p = price_cart(&items, None, &no_categories());

        assert_eq!(p.coupon, CouponOutcome::NotApplied);
        assert_eq!(p.result.subtotal, Money::from_cents(2997));
        assert_eq!(p.result.discount, Money::zero());
        assert_eq!(p.result.total, Money::from_cents(2997));
    }

    #[test]
    fn test_percentage_rounding_is_single_step() {
        // 3 × 3.33 = 9.99; 15% = 1.4985 → 1.50
        let items = vec![line("a", 333, 3)];
        let c = coupon("percentage", 15.0, 0.0);

        let p = price_cart(&items, Some(&c), &no_categories());

        assert_eq!(p.result.discount, Money::from_cents(150));
        assert_eq!(p.result.total, Money::from_cents(849));
    }

    #[test]
    fn test_percentage_over_hundred_is_clamped() {
        let items = vec![line("a", 1000, 1)];
        let c = coupon("percentage", 150.0, 0.0);

        let p = price_cart(&items, Some(&c), &no_categories());
        assert_eq!(p.result.discount, Money::from_cents(1000));
        assert_eq!(p.result.total, Money::zero());
    }

    #[test]
    fn test_oversized_lines_saturate_instead_of_panicking() {
        let items = vec![line("a", i64::MAX / 2, 3), line("b", i64::MAX / 2, 1)];

        let p = price_cart(&items, None, &no_categories());
        assert_eq!(p.result.subtotal, Money::from_cents(i64::MAX));
        assert_eq!(p.result.total, Money::from_cents(i64::MAX));

        let p = price_cart(&items, Some(&coupon("percentage", 10.0, 0.0)), &no_categories());
        assert_eq!(p.coupon, CouponOutcome::Applied);
        assert_invariants(&p);
    }

    #[test]
    fn test_invariants_hold_across_many_carts() {
        let coupons = vec![
            coupon("percentage", 0.0, 0.0),
            coupon("percentage", 12.5, 0.0),
            coupon("percentage", 100.0, 5.0),
            coupon("fixed", 0.01, 0.0),
            coupon("fixed", 7.77, 20.0),
            coupon("fixed", 1000.0, 0.0),
            scoped(coupon("percentage", 33.0, 0.0), "products", &["p0", "p3"]),
            scoped(coupon("fixed", 15.0, 0.0), "categories", &["Even"]),
        ];
        let mut categories = HashMap::new();
        for i in 0..8 {
            let cat = if i % 2 == 0 { "Even" } else { "Odd" };
            categories.insert(format!("p{}", i), cat.to_string());
        }

        for size in 0..8i64 {
            let items: Vec<CartItem> = (0..size)
                .map(|i| line(&format!("p{}", i), 137 * (i + 1) + 1, (i % 3) + 1))
                .collect();
            let expected_subtotal: i64 = items
                .iter()
                .map(|l| l.unit_price_cents * l.quantity)
                .sum();

            assert_invariants(&price_cart(&items, None, &categories));
            for c in &coupons {
                let p = price_cart(&items, Some(c), &categories);
                assert_invariants(&p);
                assert_eq!(p.result.subtotal.cents(), expected_subtotal);
                if items.is_empty() {
                    assert_eq!(p.result.total, Money::zero());
                    assert_eq!(p.coupon, CouponOutcome::NotApplied);
                }
                if c.applies_to == crate::coupon::CouponScope::All && !items.is_empty() {
                    assert_eq!(p.result.eligible_subtotal, p.result.subtotal);
                }
            }
        }
    }
}
