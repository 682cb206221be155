//! # Catalog Routes
//!
//! Public, read-only views of the product catalog and the home page.
//!
//! ```text
//! GET /api/home                      featured + loved strips, testimonials,
//!                                    menus, settings
//! GET /api/categories                category list (navigation)
//! GET /api/settings                  resolved store settings (site chrome)
//! GET /api/products[?category=NAME]  products grouped by category
//! GET /api/products/search?query=    substring search, grouped
//! GET /api/products/suggest?q=       search-as-you-type (≤ 6 hits)
//! GET /api/products/{id}             product + related products
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shopfront_core::catalog::{group_by_category, ProductGroup, Suggestion};
use shopfront_core::settings::StoreSettings;
use shopfront_core::validation::validate_search_query;
use shopfront_core::{Category, Page, Product, Testimonial};
use shopfront_db::repository::product::{HOME_STRIP_LIMIT, RELATED_LIMIT};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/categories", get(categories))
        .route("/api/settings", get(settings))
        .route("/api/products", get(list_products))
        .route("/api/products/search", get(search_products))
        .route("/api/products/suggest", get(suggest_products))
        .route("/api/products/{id}", get(product_detail))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub featured: Vec<Product>,
    pub loved: Vec<Product>,
    pub testimonials: Vec<Testimonial>,
    pub header_pages: Vec<Page>,
    pub footer_pages: Vec<Page>,
    pub settings: StoreSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub total: usize,
    pub groups: Vec<ProductGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: Product,
    pub related: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: String,
}

async fn home(State(state): State<AppState>) -> ApiResult<Json<HomePage>> {
    let products = state.db.products();
    let pages = state.db.pages();

    Ok(Json(HomePage {
        featured: products.featured(HOME_STRIP_LIMIT).await?,
        loved: products.loved(HOME_STRIP_LIMIT).await?,
        testimonials: state.db.testimonials().list().await?,
        header_pages: pages.header().await?,
        footer_pages: pages.footer().await?,
        settings: state.db.settings().load().await?,
    }))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

async fn settings(State(state): State<AppState>) -> ApiResult<Json<StoreSettings>> {
    Ok(Json(state.db.settings().load().await?))
}

async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Json<Vec<ProductGroup>>> {
    let repo = state.db.products();
    let products = match filter.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => repo.by_category(category).await?,
        _ => repo.list_all().await?,
    };
    Ok(Json(group_by_category(products)))
}

async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResults>> {
    let query = validate_search_query(&params.query)?;
    let products = state.db.products().search(&query).await?;
    debug!(query = %query, hits = products.len(), "Product search");

    Ok(Json(SearchResults {
        total: products.len(),
        groups: group_by_category(products),
        query,
    }))
}

async fn suggest_products(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> ApiResult<Json<Vec<Suggestion>>> {
    let query = validate_search_query(&params.q)?;
    Ok(Json(state.db.products().suggest(&query).await?))
}

async fn product_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let repo = state.db.products();
    let product = repo
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    let related = repo.related(&product, RELATED_LIMIT).await?;

    Ok(Json(ProductDetail { product, related }))
}
