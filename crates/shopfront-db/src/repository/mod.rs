//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().search("norton")                                │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, query)                                              │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, draft)                                              │
//! │  └── update(&self, id, draft)                                          │
//! │       │                                                                 │
//! │       │  SQL Query → Row struct (FromRow) → domain type                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `*Row` structs and converted into the
//! `shopfront-core` types; JSON-encoded columns are decoded during that
//! conversion.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog listing, search, CRUD
//! - [`category::CategoryRepository`] - Categories
//! - [`coupon::CouponRepository`] - Coupons (validated on load)
//! - [`order::OrderRepository`] - Orders with item snapshots
//! - [`page::PageRepository`] - CMS pages and menus
//! - [`testimonial::TestimonialRepository`] - Home page testimonials
//! - [`contact::ContactRepository`] - Contact form inbox
//! - [`setting::SettingRepository`] - Store settings key/value pairs
//! - [`user::UserRepository`] - Accounts and credentials

pub mod category;
pub mod contact;
pub mod coupon;
pub mod order;
pub mod page;
pub mod product;
pub mod setting;
pub mod testimonial;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DbResult;

/// Encodes a value for a JSON TEXT column.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> DbResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes a JSON TEXT column.
pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> DbResult<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Generates a new UUID v4 id.
pub(crate) fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
