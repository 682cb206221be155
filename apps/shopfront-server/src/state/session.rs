//! # Session Store
//!
//! Per-shopper state kept in memory: the cart, the applied coupon code,
//! saved checkout details, the logged-in user and the checkout in flight.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request without x-session-id ──► mint UUID ──► echoed in response     │
//! │                                                                         │
//! │  request with x-session-id ─────► same Session (created on first use)  │
//! │                                                                         │
//! │  order captured ────────────────► purchased units leave the cart;      │
//! │                                   coupon, details, pending checkout    │
//! │                                   cleared (user stays)                 │
//! │                                                                         │
//! │  idle > SESSION_IDLE_HOURS ─────► purged by the sweeper task           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! `read` and `update` hold the DashMap shard lock only for the closure.
//! Closures are synchronous, so an entry is never held across an `.await`.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use shopfront_core::cart::{Cart, CartItem};
use shopfront_core::pricing::PricingResult;
use shopfront_core::validation::validate_uuid;
use shopfront_core::{ShippingAddress, User};
use tracing::debug;
use uuid::Uuid;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

/// Sessions untouched for this many hours are dropped.
pub const SESSION_IDLE_HOURS: i64 = 24;

/// Session id resolved by [`session_layer`], available to handlers as an
/// `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A priced cart handed to the payment provider and awaiting capture.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCheckout {
    pub payment_order_id: String,
    pub items: Vec<CartItem>,
    pub pricing: PricingResult,
    pub coupon_code: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub cart: Cart,
    /// Upper-case code; only stored after a successful apply.
    pub coupon_code: Option<String>,
    pub customer: Option<ShippingAddress>,
    pub user: Option<User>,
    pub pending_checkout: Option<PendingCheckout>,
    pub touched_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            cart: Cart::new(),
            coupon_code: None,
            customer: None,
            user: None,
            pending_checkout: None,
            touched_at: Utc::now(),
        }
    }
}

impl Session {
    /// Settles a captured purchase: the purchased units leave the cart and
    /// everything else tied to the checkout is forgotten. Lines added after
    /// the checkout started stay in the cart. The login survives.
    pub fn settle_purchase(&mut self, purchased: &[CartItem]) {
        self.cart.items.retain_mut(|item| {
            if let Some(bought) = purchased.iter().find(|b| b.product_id == item.product_id) {
                item.quantity -= bought.quantity;
            }
            item.quantity > 0
        });
        self.coupon_code = None;
        self.customer = None;
        self.pending_checkout = None;
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(User::is_admin).unwrap_or(false)
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// Runs `f` against the session. Unknown ids see an empty session
    /// without one being created.
    pub fn read<F, R>(&self, id: &SessionId, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        match self.sessions.get(id.as_str()) {
            Some(session) => f(&*session),
            None => f(&Session::default()),
        }
    }

    /// Runs `f` with write access, creating the session on first use.
    pub fn update<F, R>(&self, id: &SessionId, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut session = self.sessions.entry(id.0.clone()).or_default();
        session.touched_at = Utc::now();
        f(&mut *session)
    }

    pub fn remove(&self, id: &SessionId) {
        self.sessions.remove(id.as_str());
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than `max_idle`. Returns how many went.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.touched_at > cutoff);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "Purged idle sessions");
        }
        purged
    }
}

/// Resolves the session id from the request header, minting one when it is
/// absent or not a UUID, and echoes it on the response.
pub async fn session_layer(mut request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(&SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| validate_uuid(v).is_ok())
        .map(str::to_string);

    let id = match supplied {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            debug!(session = %id, "Minted session id");
            id
        }
    };

    request.extensions_mut().insert(SessionId(id.clone()));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::Money;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[test]
    fn test_read_does_not_create() {
        let store = SessionStore::new();
        let count = store.read(&sid("a"), |s| s.cart.item_count());
        assert_eq!(count, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_creates_and_persists() {
        let store = SessionStore::new();
        store
            .update(&sid("a"), |s| {
                s.cart.add_line("p1", "Suite", None, Money::from_cents(999), 2)
            })
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.read(&sid("a"), |s| s.cart.item_count()), 2);
        assert_eq!(store.read(&sid("b"), |s| s.cart.item_count()), 0);
    }

    #[test]
    fn test_settle_purchase_keeps_login() {
        let store = SessionStore::new();
        store.update(&sid("a"), |s| {
            s.coupon_code = Some("WELCOME10".to_string());
            s.customer = Some(ShippingAddress::default());
            s.user = Some(User {
                id: "u1".to_string(),
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                role: shopfront_core::UserRole::Customer,
                is_blocked: false,
                full_name: "Ada".to_string(),
                created_at: Utc::now(),
            });
            s.settle_purchase(&[]);
        });

        store.read(&sid("a"), |s| {
            assert!(s.coupon_code.is_none());
            assert!(s.customer.is_none());
            assert!(s.user.is_some());
            assert!(!s.is_admin());
        });
    }

    #[test]
    fn test_settle_purchase_keeps_lines_added_after_checkout() {
        let mut session = Session::default();
        session
            .cart
            .add_line("p1", "Suite", None, Money::from_cents(999), 2)
            .unwrap();
        let purchased = session.cart.items.clone();

        session
            .cart
            .add_line("p1", "Suite", None, Money::from_cents(999), 1)
            .unwrap();
        session
            .cart
            .add_line("p2", "VPN", None, Money::from_cents(500), 1)
            .unwrap();
        session.coupon_code = Some("SAVE10".to_string());

        session.settle_purchase(&purchased);

        let left: Vec<(&str, i64)> = session
            .cart
            .items
            .iter()
            .map(|i| (i.product_id.as_str(), i.quantity))
            .collect();
        assert_eq!(left, vec![("p1", 1), ("p2", 1)]);
        assert!(session.coupon_code.is_none());
    }

    #[test]
    fn test_settle_purchase_empties_unchanged_cart() {
        let mut session = Session::default();
        session
            .cart
            .add_line("p1", "Suite", None, Money::from_cents(999), 2)
            .unwrap();
        let purchased = session.cart.items.clone();

        session.settle_purchase(&purchased);
        assert!(session.cart.is_empty());
    }

    #[test]
    fn test_purge_idle() {
        let store = SessionStore::new();
        store.update(&sid("old"), |s| s.touched_at = Utc::now() - Duration::hours(48));
        store.update(&sid("new"), |_| ());

        assert_eq!(store.purge_idle(Duration::hours(SESSION_IDLE_HOURS)), 1);
        assert_eq!(store.len(), 1);
    }
}
