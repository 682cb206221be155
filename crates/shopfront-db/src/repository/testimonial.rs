//! # Testimonial Repository
//!
//! Customer quotes for the home page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::validation::{validate_rating, validate_required, ValidationResult};
use shopfront_core::{Testimonial, DEFAULT_TESTIMONIAL_IMAGE};

#[derive(Debug, sqlx::FromRow)]
struct TestimonialRow {
    id: String,
    quote: String,
    rating: f64,
    user_name: String,
    user_image: String,
    created_at: DateTime<Utc>,
}

impl From<TestimonialRow> for Testimonial {
    fn from(row: TestimonialRow) -> Self {
        Testimonial {
            id: row.id,
            quote: row.quote,
            rating: row.rating,
            user_name: row.user_name,
            user_image: row.user_image,
            created_at: row.created_at,
        }
    }
}

/// Admin input for a testimonial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestimonialDraft {
    pub quote: String,
    pub rating: f64,
    pub user_name: String,
    /// Blank falls back to the default avatar.
    pub user_image: String,
}

impl Default for TestimonialDraft {
    fn default() -> Self {
        TestimonialDraft {
            quote: String::new(),
            rating: 5.0,
            user_name: String::new(),
            user_image: String::new(),
        }
    }
}

impl TestimonialDraft {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("quote", &self.quote)?;
        validate_required("userName", &self.user_name)?;
        validate_rating(self.rating)
    }

    fn image(&self) -> String {
        let image = self.user_image.trim();
        if image.is_empty() {
            DEFAULT_TESTIMONIAL_IMAGE.to_string()
        } else {
            image.to_string()
        }
    }
}

/// Repository for testimonials.
#[derive(Debug, Clone)]
pub struct TestimonialRepository {
    pool: SqlitePool,
}

impl TestimonialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TestimonialRepository { pool }
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<Testimonial>> {
        let rows = sqlx::query_as::<_, TestimonialRow>(
            "SELECT id, quote, rating, user_name, user_image, created_at \
             FROM testimonials ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Testimonial::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Testimonial>> {
        let row = sqlx::query_as::<_, TestimonialRow>(
            "SELECT id, quote, rating, user_name, user_image, created_at \
             FROM testimonials WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Testimonial::from))
    }

    pub async fn insert(&self, draft: &TestimonialDraft) -> DbResult<Testimonial> {
        let testimonial = Testimonial {
            id: generate_id(),
            quote: draft.quote.trim().to_string(),
            rating: draft.rating,
            user_name: draft.user_name.trim().to_string(),
            user_image: draft.image(),
            created_at: Utc::now(),
        };

        debug!(id = %testimonial.id, "Inserting testimonial");

        sqlx::query(
            "INSERT INTO testimonials (id, quote, rating, user_name, user_image, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&testimonial.id)
        .bind(&testimonial.quote)
        .bind(testimonial.rating)
        .bind(&testimonial.user_name)
        .bind(&testimonial.user_image)
        .bind(testimonial.created_at)
        .execute(&self.pool)
        .await?;

        Ok(testimonial)
    }

    pub async fn update(&self, id: &str, draft: &TestimonialDraft) -> DbResult<Testimonial> {
        debug!(id = %id, "Updating testimonial");

        let result = sqlx::query(
            "UPDATE testimonials SET quote = ?2, rating = ?3, user_name = ?4, user_image = ?5 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(draft.quote.trim())
        .bind(draft.rating)
        .bind(draft.user_name.trim())
        .bind(draft.image())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Testimonial", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Testimonial", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM testimonials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Testimonial", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn draft(name: &str) -> TestimonialDraft {
        TestimonialDraft {
            quote: "Instant activation, great price.".to_string(),
            user_name: name.to_string(),
            ..TestimonialDraft::default()
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft("Ada").validate().is_ok());
        assert!(draft(" ").validate().is_err());

        let mut d = draft("Ada");
        d.rating = 6.0;
        assert!(d.validate().is_err());
    }

    #[tokio::test]
    async fn test_crud() {
        let db = test_db().await;
        let repo = db.testimonials();

        let created = repo.insert(&draft("Ada")).await.unwrap();
        assert_eq!(created.user_image, DEFAULT_TESTIMONIAL_IMAGE);
        assert_eq!(created.rating, 5.0);

        let mut changed = draft("Ada L.");
        changed.user_image = "/image/ada.png".to_string();
        changed.rating = 4.0;
        let updated = repo.update(&created.id, &changed).await.unwrap();
        assert_eq!(updated.user_name, "Ada L.");
        assert_eq!(updated.user_image, "/image/ada.png");

        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.update(&created.id, &changed).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
