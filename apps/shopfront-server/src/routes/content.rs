//! # Content Routes
//!
//! CMS pages and the public contact form.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shopfront_core::validation::{validate_email, validate_required};
use shopfront_core::Page;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/pages/{slug}", get(page_by_slug))
        .route("/api/contact", post(send_contact))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    #[serde(alias = "email")]
    pub sender_email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: String,
    pub message: String,
}

async fn page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Page>> {
    state
        .db
        .pages()
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Page", &slug))
}

async fn send_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> ApiResult<(StatusCode, Json<ContactReceipt>)> {
    let subject = validate_required("subject", &form.subject)?;
    let message = validate_required("message", &form.message)?;
    let sender_email = validate_email(&form.sender_email)?;

    let stored = state
        .db
        .contacts()
        .insert(&sender_email, &subject, &message)
        .await?;
    info!(id = %stored.id, "Contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ContactReceipt {
            id: stored.id,
            message: "Thanks, we'll get back to you soon.".to_string(),
        }),
    ))
}
