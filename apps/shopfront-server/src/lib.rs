//! # Shopfront Server
//!
//! JSON storefront API: catalog, session cart with coupon pricing,
//! PayPal checkout, CMS pages and the admin back office.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Client ──► CORS ──► Trace ──► session_layer ──► Router ──► Handler    │
//! │                                 (x-session-id)      │          │        │
//! │                                                     │          ▼        │
//! │                                       /api/admin ───┤      services     │
//! │                                       require_admin │     (pricing,     │
//! │                                                     │      checkout,    │
//! │                                                     │      payment)     │
//! │                                                     ▼          │        │
//! │                                               shopfront-db ◄───┘        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

use crate::state::{session_layer, SESSION_HEADER};

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([SESSION_HEADER]);

    Router::new()
        .merge(routes::catalog::routes())
        .merge(routes::content::routes())
        .merge(routes::cart::routes())
        .merge(routes::checkout::routes())
        .merge(routes::auth::routes())
        .merge(routes::admin::routes(state.clone()))
        .merge(routes::health::routes())
        .layer(middleware::from_fn(session_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
