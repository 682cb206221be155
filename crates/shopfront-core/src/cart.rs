//! # Shopping Cart
//!
//! The per-session shopping cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Shopper Action           HTTP Route              Cart Change           │
//! │  ──────────────           ──────────              ───────────           │
//! │                                                                         │
//! │  "Add to cart" ──────────► POST /cart/add ──────► merge or push line   │
//! │                                                                         │
//! │  Change quantity ────────► POST /cart/update ───► line.qty = n         │
//! │                                                  (n ≤ 0 removes line)   │
//! │                                                                         │
//! │  Click remove ───────────► POST /cart/remove ───► drop line            │
//! │                                                                         │
//! │  Order captured ─────────► (checkout) ──────────► clear()              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart only stores lines. Totals and coupon discounts are always
//! recomputed by [`crate::pricing::price_cart`] and never stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the shopping cart.
///
/// ## Design Notes
/// - `product_id`: business id of the product (`p1`)
/// - `name`, `image`, `unit_price_cents`: frozen copy of the product at the
///   time it was added. The cart keeps showing and charging the same price
///   even if the catalog changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Product image at time of adding (frozen)
    pub image: Option<String>,

    /// Price in cents at time of adding (frozen)
    pub unit_price_cents: i64,

    /// Always ≥ 1 while the line exists
    pub quantity: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new cart line from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: Some(product.image.clone()).filter(|i| !i.is_empty()),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - Quantity is > 0 (setting it to 0 or below removes the line)
/// - At most `MAX_CART_ITEMS` lines, each with at most `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a catalog product to the cart, freezing its current price.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        let image = Some(product.image.as_str()).filter(|i| !i.is_empty());
        self.add_line(&product.id, &product.name, image, product.price(), quantity)
    }

    /// Adds a line or increases the quantity of an existing one.
    ///
    /// ## Behavior
    /// - Product already in cart: quantities add up, the frozen price is kept
    /// - Product not in cart: a new line is appended
    pub fn add_line(
        &mut self,
        product_id: &str,
        name: &str,
        image: Option<&str>,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem {
            product_id: product_id.to_string(),
            name: name.to_string(),
            image: image.map(str::to_string),
            unit_price_cents: unit_price.cents(),
            quantity,
            added_at: Utc::now(),
        });
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - quantity ≤ 0: removes the line
    /// - product not in cart: `CoreError::NotInCart`
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product_id.to_string())),
        }
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Total number of units across all lines (the cart badge figure).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Σ line totals, before any coupon.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct product ids in cart order.
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}
