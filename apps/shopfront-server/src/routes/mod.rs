//! # Routes
//!
//! HTTP handlers, one module per area. Handlers stay thin: they extract,
//! call a repository or service, and wrap the result in `Json`.
//!
//! - [`catalog`] - home page, product listings, search, product detail
//! - [`content`] - CMS pages, contact form
//! - [`cart`] - session cart and coupons
//! - [`checkout`] - customer details, provider order create/capture
//! - [`auth`] - login/logout
//! - [`admin`] - back office (admin only)
//! - [`health`] - liveness and database check

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod health;
