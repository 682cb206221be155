//! # Category Repository
//!
//! Product categories. Names are unique and the slug is derived from the
//! name on insert.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::validation::slugify;
use shopfront_core::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at FROM categories WHERE name = ?1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Creates a category. The caller validates the name.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name (or its slug) is taken
    pub async fn insert(&self, name: &str) -> DbResult<Category> {
        let name = name.trim().to_string();

        debug!(name = %name, "Inserting category");

        let category = Category {
            id: generate_id(),
            slug: slugify(&name),
            name,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO categories (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("name", &category.name),
                other => other,
            })?;

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = test_db().await;
        let repo = db.categories();

        let vpn = repo.insert(" VPN Services ").await.unwrap();
        assert_eq!(vpn.name, "VPN Services");
        assert_eq!(vpn.slug, "vpn-services");

        repo.insert("Antivirus").await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Antivirus", "VPN Services"]);

        assert!(repo.get_by_name("Antivirus").await.unwrap().is_some());
        assert!(repo.get_by_name("Nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert("Antivirus").await.unwrap();
        let err = repo.insert("Antivirus").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, ref value }
            if field == "name" && value == "Antivirus"));
    }
}
