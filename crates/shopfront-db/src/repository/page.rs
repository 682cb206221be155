//! # Page Repository
//!
//! CMS pages and the header/footer menus built from them.
//!
//! Slugs are always derived from the title, on insert and on every update,
//! so renaming a page moves its URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::validation::{slugify, validate_required, ValidationResult};
use shopfront_core::{MenuLocation, Page};

const PAGE_COLUMNS: &str =
    "id, title, slug, content, menu_location, sort_order, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PageRow {
    id: String,
    title: String,
    slug: String,
    content: String,
    menu_location: MenuLocation,
    sort_order: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Page {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            menu_location: row.menu_location,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Admin input for a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageDraft {
    pub title: String,
    pub content: String,
    pub menu_location: MenuLocation,
    #[serde(rename = "order")]
    pub sort_order: i64,
}

impl PageDraft {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("title", &self.title)?;
        validate_required("content", &self.content)?;
        let slug = slugify(&self.title);
        if slug.is_empty() {
            return Err(shopfront_core::ValidationError::InvalidFormat {
                field: "title".to_string(),
                reason: "must contain a letter or digit".to_string(),
            });
        }
        Ok(())
    }
}

/// Repository for CMS pages.
#[derive(Debug, Clone)]
pub struct PageRepository {
    pool: SqlitePool,
}

impl PageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PageRepository { pool }
    }

    /// All pages, in menu order.
    pub async fn list(&self) -> DbResult<Vec<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY sort_order, title");
        let rows = sqlx::query_as::<_, PageRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Page::from).collect())
    }

    /// Pages linked from the header (`header` or `both`).
    pub async fn header(&self) -> DbResult<Vec<Page>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.menu_location.in_header())
            .collect())
    }

    /// Pages linked from the footer (`footer` or `both`).
    pub async fn footer(&self) -> DbResult<Vec<Page>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.menu_location.in_footer())
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Page::from))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Page::from))
    }

    /// Creates a page.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - title or slug already used
    pub async fn insert(&self, draft: &PageDraft) -> DbResult<Page> {
        let now = Utc::now();
        let title = draft.title.trim().to_string();
        let page = Page {
            id: generate_id(),
            slug: slugify(&title),
            title,
            content: draft.content.clone(),
            menu_location: draft.menu_location,
            sort_order: draft.sort_order,
            created_at: now,
            updated_at: now,
        };

        debug!(slug = %page.slug, "Inserting page");

        sqlx::query(
            r#"
            INSERT INTO pages (
                id, title, slug, content, menu_location, sort_order, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&page.id)
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(page.menu_location)
        .bind(page.sort_order)
        .bind(page.created_at)
        .bind(page.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("title", &page.title),
            other => other,
        })?;

        Ok(page)
    }

    /// Replaces a page's fields and re-derives its slug.
    pub async fn update(&self, id: &str, draft: &PageDraft) -> DbResult<Page> {
        let title = draft.title.trim().to_string();
        let slug = slugify(&title);

        debug!(id = %id, slug = %slug, "Updating page");

        let result = sqlx::query(
            r#"
            UPDATE pages SET
                title = ?2,
                slug = ?3,
                content = ?4,
                menu_location = ?5,
                sort_order = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&title)
        .bind(&slug)
        .bind(&draft.content)
        .bind(draft.menu_location)
        .bind(draft.sort_order)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("title", &title),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Page", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Page", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Page", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn draft(title: &str, location: MenuLocation, order: i64) -> PageDraft {
        PageDraft {
            title: title.to_string(),
            content: format!("<p>{title}</p>"),
            menu_location: location,
            sort_order: order,
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft("About Us", MenuLocation::Header, 0).validate().is_ok());
        assert!(draft("  ", MenuLocation::Header, 0).validate().is_err());
        assert!(draft("!!!", MenuLocation::Header, 0).validate().is_err());

        let mut empty = draft("About", MenuLocation::Header, 0);
        empty.content = String::new();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_draft_accepts_order_field() {
        let d: PageDraft =
            serde_json::from_str(r#"{"title":"FAQ","content":"x","menuLocation":"both","order":3}"#)
                .unwrap();
        assert_eq!(d.sort_order, 3);
        assert_eq!(d.menu_location, MenuLocation::Both);
    }

    #[tokio::test]
    async fn test_menus() {
        let db = test_db().await;
        let repo = db.pages();

        repo.insert(&draft("Refund Policy", MenuLocation::Footer, 2)).await.unwrap();
        repo.insert(&draft("About Us", MenuLocation::Both, 1)).await.unwrap();
        repo.insert(&draft("Contact", MenuLocation::Header, 1)).await.unwrap();
        repo.insert(&draft("Secret", MenuLocation::Hidden, 0)).await.unwrap();

        let header: Vec<String> = repo.header().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(header, vec!["About Us", "Contact"]);

        let footer: Vec<String> = repo.footer().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(footer, vec!["About Us", "Refund Policy"]);

        assert_eq!(repo.list().await.unwrap().len(), 4);
        assert!(repo.get_by_slug("secret").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_reslugs() {
        let db = test_db().await;
        let repo = db.pages();

        let page = repo.insert(&draft("About Us", MenuLocation::Header, 0)).await.unwrap();
        assert_eq!(page.slug, "about-us");

        let updated = repo
            .update(&page.id, &draft("About Our Company", MenuLocation::Footer, 5))
            .await
            .unwrap();
        assert_eq!(updated.slug, "about-our-company");
        assert_eq!(updated.menu_location, MenuLocation::Footer);
        assert!(repo.get_by_slug("about-us").await.unwrap().is_none());

        repo.delete(&page.id).await.unwrap();
        assert!(matches!(repo.delete(&page.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_title() {
        let db = test_db().await;
        let repo = db.pages();

        repo.insert(&draft("FAQ", MenuLocation::Hidden, 0)).await.unwrap();
        assert!(repo
            .insert(&draft("FAQ", MenuLocation::Hidden, 0))
            .await
            .unwrap_err()
            .is_unique_violation());
    }
}
