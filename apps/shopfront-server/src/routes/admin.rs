//! # Admin Routes
//!
//! Back-office management under `/api/admin`. Every route is guarded by
//! [`require_admin`]: the session must hold a logged-in admin, otherwise
//! the request is refused with `403` before reaching a handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Resource       Routes                                                  │
//! │  ─────────      ──────                                                  │
//! │  stats          GET                                                     │
//! │  products       GET, POST · PUT, DELETE /{id}                           │
//! │  categories     GET, POST                                               │
//! │  coupons        GET, POST · PUT /{code}/active · DELETE /{code}         │
//! │  orders         GET                                                     │
//! │  users          GET                                                     │
//! │  testimonials   GET, POST · PUT, DELETE /{id}                           │
//! │  pages          GET, POST · PUT, DELETE /{id}                           │
//! │  contacts       GET · GET, DELETE /{id} · POST /{id}/read, /{id}/replied│
//! │  settings       GET, PUT                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopfront_core::coupon::{validate_coupon, Coupon, CouponDraft};
use shopfront_core::settings::StoreSettings;
use shopfront_core::validation::validate_required;
use shopfront_core::{Category, ContactMessage, Order, Page, Product, Testimonial, User};
use shopfront_db::{PageDraft, ProductDraft, TestimonialDraft};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SessionId};

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/stats", get(stats))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/categories", get(list_categories).post(create_category))
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/{code}", axum::routing::delete(delete_coupon))
        .route("/coupons/{code}/active", put(set_coupon_active))
        .route("/orders", get(list_orders))
        .route("/users", get(list_users))
        .route("/testimonials", get(list_testimonials).post(create_testimonial))
        .route(
            "/testimonials/{id}",
            put(update_testimonial).delete(delete_testimonial),
        )
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/{id}", put(update_page).delete(delete_page))
        .route("/contacts", get(list_contacts))
        .route("/contacts/{id}", get(get_contact).delete(delete_contact))
        .route("/contacts/{id}/read", post(mark_contact_read))
        .route("/contacts/{id}/replied", post(mark_contact_replied))
        .route("/settings", get(get_settings).put(update_settings))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new().nest("/api/admin", admin)
}

/// Refuses the request unless the session belongs to an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.sessions.read(&session, |s| s.user.clone());

    match user {
        Some(user) if user.is_admin() && !user.is_blocked => Ok(next.run(request).await),
        Some(user) => {
            warn!(user = %user.id, path = %request.uri().path(), "Non-admin hit an admin route");
            Err(ApiError::forbidden())
        }
        None => {
            debug!(path = %request.uri().path(), "Anonymous request to an admin route");
            Err(ApiError::forbidden())
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub products: i64,
    pub orders: i64,
    pub users: i64,
    pub unread_messages: usize,
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let unread = state
        .db
        .contacts()
        .list()
        .await?
        .iter()
        .filter(|m| !m.read)
        .count();

    Ok(Json(AdminStats {
        products: state.db.products().count().await?,
        orders: state.db.orders().count().await?,
        users: state.db.users().count().await?,
        unread_messages: unread,
    }))
}

// =============================================================================
// Products & Categories
// =============================================================================

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list_all().await?))
}

/// Products may only reference an existing category.
async fn check_category(state: &AppState, name: &str) -> ApiResult<()> {
    match state.db.categories().get_by_name(name.trim()).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::validation(format!("Unknown category: {}", name.trim()))),
    }
}

async fn create_product(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    draft.validate()?;
    check_category(&state, &draft.category).await?;

    let product = state.db.products().insert(&draft).await?;
    info!(id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<Json<Product>> {
    draft.validate()?;
    check_category(&state, &draft.category).await?;

    let product = state.db.products().update(&id, &draft).await?;
    info!(id = %product.id, "Product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    info!(id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = validate_required("name", &body.name)?;
    let category = state.db.categories().insert(&name).await?;
    info!(name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponActive {
    pub is_active: bool,
}

async fn list_coupons(State(state): State<AppState>) -> ApiResult<Json<Vec<Coupon>>> {
    Ok(Json(state.db.coupons().list().await?))
}

async fn create_coupon(
    State(state): State<AppState>,
    Json(draft): Json<CouponDraft>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let coupon = validate_coupon(draft)?;
    state.db.coupons().insert(&coupon).await?;
    info!(code = %coupon.code, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn set_coupon_active(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<CouponActive>,
) -> ApiResult<StatusCode> {
    state.db.coupons().set_active(&code, body.is_active).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.coupons().delete(&code).await?;
    info!(code = %code, "Coupon deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders & Users
// =============================================================================

async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.orders().list().await?))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}

// =============================================================================
// Testimonials
// =============================================================================

async fn list_testimonials(State(state): State<AppState>) -> ApiResult<Json<Vec<Testimonial>>> {
    Ok(Json(state.db.testimonials().list().await?))
}

async fn create_testimonial(
    State(state): State<AppState>,
    Json(draft): Json<TestimonialDraft>,
) -> ApiResult<(StatusCode, Json<Testimonial>)> {
    draft.validate()?;
    let testimonial = state.db.testimonials().insert(&draft).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<TestimonialDraft>,
) -> ApiResult<Json<Testimonial>> {
    draft.validate()?;
    Ok(Json(state.db.testimonials().update(&id, &draft).await?))
}

async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.testimonials().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Pages
// =============================================================================

async fn list_pages(State(state): State<AppState>) -> ApiResult<Json<Vec<Page>>> {
    Ok(Json(state.db.pages().list().await?))
}

async fn create_page(
    State(state): State<AppState>,
    Json(draft): Json<PageDraft>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    draft.validate()?;
    let page = state.db.pages().insert(&draft).await?;
    info!(slug = %page.slug, "Page created");
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<PageDraft>,
) -> ApiResult<Json<Page>> {
    draft.validate()?;
    Ok(Json(state.db.pages().update(&id, &draft).await?))
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.pages().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Contact Inbox
// =============================================================================

async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<ContactMessage>>> {
    Ok(Json(state.db.contacts().list().await?))
}

async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContactMessage>> {
    state
        .db
        .contacts()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("ContactMessage", &id))
}

async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.contacts().mark_read(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_contact_replied(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.contacts().mark_replied(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.contacts().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Settings
// =============================================================================

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<StoreSettings>> {
    Ok(Json(state.db.settings().load().await?))
}

/// Upserts the given keys. Unknown keys and values of the wrong JSON type
/// reject the whole update.
async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<StoreSettings>> {
    let mut entries = Vec::with_capacity(body.len());
    for (key, value) in body {
        if !StoreSettings::is_known_key(&key) {
            return Err(ApiError::validation(format!("Unknown setting: {}", key)));
        }
        if !StoreSettings::accepts(&key, &value) {
            return Err(ApiError::validation(format!("Invalid value for setting: {}", key)));
        }
        entries.push((key, value));
    }

    state.db.settings().upsert_many(&entries).await?;
    info!(count = entries.len(), "Settings updated");
    Ok(Json(state.db.settings().load().await?))
}
