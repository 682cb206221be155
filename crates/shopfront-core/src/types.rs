//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Checkout                 Content               │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │    Product      │     │     Order       │     │      Page       │   │
//! │  │  id ("p12")     │     │  id (UUID)      │     │  slug           │   │
//! │  │  category       │     │  status         │     │  menu_location  │   │
//! │  │  price_cents    │     │  total_cents    │     └─────────────────┘   │
//! │  └────────┬────────┘     │  items[]        │     ┌─────────────────┐   │
//! │           │              └─────────────────┘     │  Testimonial    │   │
//! │           ▼                                      │  ContactMessage │   │
//! │  ┌─────────────────┐     ┌─────────────────┐     └─────────────────┘   │
//! │  │   ProductRef    │     │   Percentage    │                           │
//! │  │  id + category  │     │  bps (u32)      │     Accounts              │
//! │  │  (pricing view) │     │  1000 = 10%     │     ┌─────────────────┐   │
//! │  └─────────────────┘     └─────────────────┘     │  User, UserRole │   │
//! │                                                  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products are addressed by their business id (`p1`, `p2`, ...) because
//! carts, coupons and order snapshots all reference that id. Every other
//! entity uses a UUID v4 `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%, 1250 bps = 12.5%
///
/// Percentage coupons store their rate this way so the pricing engine
/// never touches a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a rate from a percentage value (`12.5` → 1250 bps).
    ///
    /// Returns `None` for negative or non-finite input.
    pub fn from_percentage(pct: f64) -> Option<Self> {
        if !pct.is_finite() || pct < 0.0 {
            return None;
        }
        let bps = (pct * 100.0).round();
        if bps > u32::MAX as f64 {
            return None;
        }
        Some(Percentage(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Business identifier (`p1`, `p2`, ...).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Category name (matches `Category::name`).
    pub category: String,

    /// Vendor, e.g. "McAfee".
    pub brand: String,

    /// Supported platforms, free text ("Windows, macOS").
    pub platform: String,

    /// Delivery method, free text ("Instant Email Delivery").
    pub delivery: String,

    /// List price before the sale, in cents.
    pub old_price_cents: i64,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Advertised saving, whole percent.
    pub save_percent: i64,

    /// Image path or URL.
    pub image: String,

    pub short_desc: String,

    /// Long description, one paragraph per entry.
    pub long_desc: Vec<String>,

    /// Average rating, 0 to 5.
    pub rating: f64,

    /// Shown in the home page "featured" strip.
    pub is_featured: bool,

    /// Shown in the home page "customers love" strip.
    pub is_loved: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// The subset of the product the pricing engine needs.
    pub fn to_ref(&self) -> ProductRef {
        ProductRef {
            product_id: self.id.clone(),
            category: self.category.clone(),
        }
    }
}

/// Read-only catalog view used for coupon category eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductRef {
    pub product_id: String,
    pub category: String,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Names are unique; the slug is derived from the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// Status of a captured order, as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment is not settled yet.
    Pending,
    /// Funds captured.
    Completed,
    /// Provider declined or failed the capture.
    Failed,
    /// Fully or partially refunded.
    Refunded,
}

impl OrderStatus {
    /// Maps a provider status string (`COMPLETED`, `DECLINED`, ...) to an
    /// order status. Unknown values are treated as pending.
    pub fn from_provider(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "COMPLETED" => OrderStatus::Completed,
            "DECLINED" | "FAILED" | "VOIDED" => OrderStatus::Failed,
            "REFUNDED" | "PARTIALLY_REFUNDED" => OrderStatus::Refunded,
            _ => OrderStatus::Pending,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// Customer contact and delivery details collected before payment.
///
/// Every field is optional free text; the storefront sells digital goods so
/// only `full_name` and `email` are normally filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn is_empty(&self) -> bool {
        *self == ShippingAddress::default()
    }
}

/// A line of an order. Uses the snapshot pattern to freeze the product data
/// at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    pub quantity: i64,
    pub image: Option<String>,
}

/// A paid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Logged-in user who placed the order, if any.
    pub user_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    /// Order id assigned by the payment provider (unique).
    pub payment_order_id: String,
    pub payer_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// Amount actually captured.
    pub total_cents: i64,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Name used on orders placed without details or an account.
pub const GUEST_NAME: &str = "Guest";

/// Email used on orders placed without details or an account.
pub const GUEST_EMAIL: &str = "guest@example.com";

// =============================================================================
// CMS Content
// =============================================================================

/// Where a CMS page is linked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    /// Reachable by URL only.
    #[serde(rename = "none")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "none"))]
    Hidden,
    Header,
    Footer,
    Both,
}

impl MenuLocation {
    pub fn in_header(&self) -> bool {
        matches!(self, MenuLocation::Header | MenuLocation::Both)
    }

    pub fn in_footer(&self) -> bool {
        matches!(self, MenuLocation::Footer | MenuLocation::Both)
    }
}

impl Default for MenuLocation {
    fn default() -> Self {
        MenuLocation::Hidden
    }
}

/// A CMS page ("About us", "Refund policy", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub menu_location: MenuLocation,
    /// Position within its menu, ascending.
    #[serde(rename = "order")]
    pub sort_order: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Image shown for testimonials submitted without one.
pub const DEFAULT_TESTIMONIAL_IMAGE: &str = "/image/default-user.png";

/// A customer quote shown on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Testimonial {
    pub id: String,
    pub quote: String,
    pub rating: f64,
    pub user_name: String,
    pub user_image: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactMessage {
    pub id: String,
    /// Lower-cased on submission.
    pub sender_email: String,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub replied: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// A storefront account. The password hash never leaves shopfront-db.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_blocked: bool,
    pub full_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_from_bps() {
        let rate = Percentage::from_bps(1250);
        assert_eq!(rate.bps(), 1250);
        assert!((rate.percentage() - 12.5).abs() < 0.001);
    }

    #[test]
    fn test_percentage_from_percentage() {
        assert_eq!(Percentage::from_percentage(10.0), Some(Percentage::from_bps(1000)));
        assert_eq!(Percentage::from_percentage(8.25), Some(Percentage::from_bps(825)));
        assert_eq!(Percentage::from_percentage(-1.0), None);
        assert_eq!(Percentage::from_percentage(f64::NAN), None);
    }

    #[test]
    fn test_order_status_from_provider() {
        assert_eq!(OrderStatus::from_provider("COMPLETED"), OrderStatus::Completed);
        assert_eq!(OrderStatus::from_provider("DECLINED"), OrderStatus::Failed);
        assert_eq!(OrderStatus::from_provider("PARTIALLY_REFUNDED"), OrderStatus::Refunded);
        assert_eq!(OrderStatus::from_provider("PENDING"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_provider("SOMETHING_NEW"), OrderStatus::Pending);
    }

    #[test]
    fn test_menu_location_placement() {
        assert!(MenuLocation::Both.in_header());
        assert!(MenuLocation::Both.in_footer());
        assert!(MenuLocation::Header.in_header());
        assert!(!MenuLocation::Header.in_footer());
        assert!(!MenuLocation::Hidden.in_header());
        assert!(!MenuLocation::Hidden.in_footer());
    }

    #[test]
    fn test_menu_location_serializes_hidden_as_none() {
        let json = serde_json::to_string(&MenuLocation::Hidden).unwrap();
        assert_eq!(json, "\"none\"");
        let parsed: MenuLocation = serde_json::from_str("\"footer\"").unwrap();
        assert_eq!(parsed, MenuLocation::Footer);
    }

    #[test]
    fn test_shipping_address_defaults() {
        let addr: ShippingAddress = serde_json::from_str(r#"{"fullName":"Ada"}"#).unwrap();
        assert_eq!(addr.full_name, "Ada");
        assert!(addr.city.is_empty());
        assert!(!addr.is_empty());
        assert!(ShippingAddress::default().is_empty());
    }

    #[test]
    fn test_role_default() {
        assert_eq!(UserRole::default(), UserRole::Customer);
    }
}
