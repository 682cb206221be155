//! # shopfront-core: Pure Business Logic for Shopfront
//!
//! This crate is the **heart** of Shopfront. It contains the storefront's
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront / Admin frontend                  │   │
//! │  │    Catalog ──► Cart ──► Coupon ──► Checkout ──► Order          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shopfront-server (axum)                      │   │
//! │  │    sessions, pricing adapter, checkout, admin routes           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ coupon  │ │ pricing │ │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ Coupon  │ │ engine  │ │   │
//! │  │   │  Order  │ │ Percent │ │CartItem │ │  rules  │ │         │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shopfront-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Page, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Session shopping cart
//! - [`catalog`] - Category grouping and search suggestions
//! - [`coupon`] - Coupon definitions, load-time validation, redeemability
//! - [`pricing`] - The cart pricing engine
//! - [`settings`] - Store-wide settings resolved from key/value entries
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use shopfront_core::cart::Cart;
//! use shopfront_core::coupon::{validate_coupon, CouponDraft};
//! use shopfront_core::pricing::price_cart;
//! use shopfront_core::Money;
//!
//! let mut cart = Cart::new();
//! cart.add_line("p1", "Watchdog Antivirus", None, Money::from_cents(3000), 1).unwrap();
//! cart.add_line("p2", "McAfee Antivirus", None, Money::from_cents(2000), 1).unwrap();
//!
//! let coupon = validate_coupon(CouponDraft {
//!     code: "save10".into(),
//!     discount_type: "percentage".into(),
//!     discount_value: 10.0,
//!     min_order_amount: 10.0,
//!     ..CouponDraft::default()
//! })
//! .unwrap();
//!
//! let categories: HashMap<String, String> = HashMap::new();
//! let pricing = price_cart(&cart.items, Some(&coupon), &categories);
//!
//! assert_eq!(pricing.result.discount, Money::from_cents(500));
//! assert_eq!(pricing.result.total, Money::from_cents(4500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopfront_core::Money` instead of
// `use shopfront_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the payment provider's purchase unit
/// list at a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest product price accepted by the catalog, in cents (1,000,000.00).
///
/// Together with the cart limits this keeps every cart total far inside
/// the i64 cent range.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Currency used when the store settings don't name one.
pub const DEFAULT_CURRENCY: &str = "USD";
