//! # Services
//!
//! Request-independent logic the route handlers delegate to.
//!
//! - [`pricing`] - session cart → engine inputs → cart summary
//! - [`checkout`] - provider order creation and capture
//! - [`payment`] - the payment provider seam and its PayPal implementation

pub mod checkout;
pub mod payment;
pub mod pricing;
