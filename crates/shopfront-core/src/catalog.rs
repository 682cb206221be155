//! # Catalog Views
//!
//! Shapes the storefront's product listings take over the wire.
//!
//! The product listing and search pages both show products under a heading
//! per category. Grouping keeps the order the products arrive in, so a
//! name-sorted query produces name-sorted groups.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;

/// Products sharing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductGroup {
    pub category: String,
    pub products: Vec<Product>,
}

/// A search-as-you-type hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub image: String,
    pub price_cents: i64,
}

impl From<&Product> for Suggestion {
    fn from(product: &Product) -> Self {
        Suggestion {
            id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price_cents: product.price_cents,
        }
    }
}

/// Groups products by category, in order of first appearance.
pub fn group_by_category(products: Vec<Product>) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();

    for product in products {
        match groups.iter_mut().find(|g| g.category == product.category) {
            Some(group) => group.products.push(product),
            None => groups.push(ProductGroup {
                category: product.category.clone(),
                products: vec![product],
            }),
        }
    }

    groups
}
