//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Listing (all, by category, featured, loved, related)
//! - Substring search and prefix suggestions
//! - Category lookups for the pricing engine (`refs_for`)
//! - Admin CRUD with `p<N>` id assignment
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Search vs Suggest                                    │
//! │                                                                         │
//! │  search("secure")                                                      │
//! │    name | short_desc | brand | category  LIKE '%secure%'               │
//! │    ORDER BY name                (case-insensitive, no limit)           │
//! │                                                                         │
//! │  suggest("no")                                                         │
//! │    name | brand  LIKE 'no%'                                            │
//! │    ORDER BY name LIMIT 6        (fewer than 2 chars → nothing)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `%`, `_` and `\` in user input are escaped, so they match literally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use shopfront_core::catalog::Suggestion;
use shopfront_core::validation::{
    validate_price_cents, validate_product_id, validate_product_name, validate_rating,
    validate_required, ValidationResult,
};
use shopfront_core::{Product, ProductRef};

/// Products shown in each home page strip.
pub const HOME_STRIP_LIMIT: i64 = 4;

/// Related products shown on a product page.
pub const RELATED_LIMIT: i64 = 4;

/// Maximum search-as-you-type suggestions.
pub const SUGGEST_LIMIT: i64 = 6;

/// Shortest query that produces suggestions.
pub const SUGGEST_MIN_CHARS: usize = 2;

const PRODUCT_COLUMNS: &str = "id, name, category, brand, platform, delivery, \
     old_price_cents, price_cents, save_percent, image, short_desc, long_desc, \
     rating, is_featured, is_loved, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    brand: String,
    platform: String,
    delivery: String,
    old_price_cents: i64,
    price_cents: i64,
    save_percent: i64,
    image: String,
    short_desc: String,
    long_desc: String,
    rating: f64,
    is_featured: bool,
    is_loved: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            long_desc: from_json(&row.long_desc)?,
            id: row.id,
            name: row.name,
            category: row.category,
            brand: row.brand,
            platform: row.platform,
            delivery: row.delivery,
            old_price_cents: row.old_price_cents,
            price_cents: row.price_cents,
            save_percent: row.save_percent,
            image: row.image,
            short_desc: row.short_desc,
            rating: row.rating,
            is_featured: row.is_featured,
            is_loved: row.is_loved,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRefRow {
    id: String,
    category: String,
}

// =============================================================================
// Draft
// =============================================================================

/// Admin input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    /// Assigned as `p<N>` when absent.
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub platform: String,
    pub delivery: String,
    pub old_price_cents: i64,
    pub price_cents: i64,
    /// Derived from the two prices when absent.
    pub save_percent: Option<i64>,
    pub image: String,
    pub short_desc: String,
    pub long_desc: Vec<String>,
    pub rating: f64,
    pub is_featured: bool,
    pub is_loved: bool,
}

impl Default for ProductDraft {
    fn default() -> Self {
        ProductDraft {
            id: None,
            name: String::new(),
            category: String::new(),
            brand: String::new(),
            platform: String::new(),
            delivery: String::new(),
            old_price_cents: 0,
            price_cents: 0,
            save_percent: None,
            image: String::new(),
            short_desc: String::new(),
            long_desc: Vec::new(),
            rating: 0.0,
            is_featured: false,
            is_loved: false,
        }
    }
}

impl ProductDraft {
    /// Validates the draft before it touches the database.
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(id) = &self.id {
            validate_product_id(id)?;
        }
        validate_product_name(&self.name)?;
        validate_required("category", &self.category)?;
        validate_required("brand", &self.brand)?;
        validate_price_cents("oldPriceCents", self.old_price_cents)?;
        validate_price_cents("priceCents", self.price_cents)?;
        validate_rating(self.rating)?;
        Ok(())
    }

    /// Advertised saving: explicit value, else derived from the prices.
    pub fn resolved_save_percent(&self) -> i64 {
        if let Some(pct) = self.save_percent {
            return pct;
        }
        if self.old_price_cents <= 0 || self.price_cents >= self.old_price_cents {
            return 0;
        }
        let saved = (self.old_price_cents - self.price_cents) as i128 * 100;
        let old = self.old_price_cents as i128;
        ((saved + old / 2) / old) as i64
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.search("norton").await?;
/// let product = repo.get_by_id("p1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Lists the products of one category, ordered by name.
    pub async fn by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        debug!(category = %category, "Listing products by category");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Case-insensitive substring search over name, short description,
    /// brand and category.
    ///
    /// An empty (or all-whitespace) query returns every product.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return self.list_all().await;
        }

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\'
               OR short_desc LIKE ?1 ESCAPE '\'
               OR brand LIKE ?1 ESCAPE '\'
               OR category LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            "#
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        into_products(rows)
    }

    /// Products whose name or brand starts with `query`.
    ///
    /// Queries shorter than [`SUGGEST_MIN_CHARS`] (after trimming) return an
    /// empty list.
    pub async fn suggest(&self, query: &str) -> DbResult<Vec<Suggestion>> {
        let query = query.trim();
        if query.chars().count() < SUGGEST_MIN_CHARS {
            return Ok(Vec::new());
        }

        let pattern = format!("{}%", escape_like(query));
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR brand LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            LIMIT ?2
            "#
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(pattern)
            .bind(SUGGEST_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        Ok(into_products(rows)?.iter().map(Suggestion::from).collect())
    }

    /// Newest featured products.
    pub async fn featured(&self, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_featured = 1 \
             ORDER BY created_at DESC, id LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Highest-rated "customers love" products.
    pub async fn loved(&self, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_loved = 1 \
             ORDER BY rating DESC, id LIMIT ?1"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Gets a product by its business id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Other products in the same category.
    pub async fn related(&self, product: &Product, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 AND id != ?2 \
             ORDER BY name, id LIMIT ?3"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.category)
            .bind(&product.id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Category of each listed product, in one query.
    ///
    /// Ids that no longer exist are simply absent from the result.
    pub async fn refs_for(&self, ids: &[String]) -> DbResult<Vec<ProductRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Fetching product categories");

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, category FROM products WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<ProductRefRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductRef {
                product_id: row.id,
                category: row.category,
            })
            .collect())
    }

    /// Next free `p<N>` id.
    pub async fn next_id(&self) -> DbResult<String> {
        let max: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(CAST(SUBSTR(id, 2) AS INTEGER)), 0) \
             FROM products WHERE id GLOB 'p[0-9]*'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(format!("p{}", max + 1))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - id already exists
    pub async fn insert(&self, draft: &ProductDraft) -> DbResult<Product> {
        let id = match &draft.id {
            Some(id) => id.trim().to_string(),
            None => self.next_id().await?,
        };

        debug!(id = %id, name = %draft.name, "Inserting product");

        let product = Product {
            id,
            name: draft.name.trim().to_string(),
            category: draft.category.trim().to_string(),
            brand: draft.brand.trim().to_string(),
            platform: draft.platform.clone(),
            delivery: draft.delivery.clone(),
            old_price_cents: draft.old_price_cents,
            price_cents: draft.price_cents,
            save_percent: draft.resolved_save_percent(),
            image: draft.image.clone(),
            short_desc: draft.short_desc.clone(),
            long_desc: draft.long_desc.clone(),
            rating: draft.rating,
            is_featured: draft.is_featured,
            is_loved: draft.is_loved,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, brand, platform, delivery,
                old_price_cents, price_cents, save_percent, image,
                short_desc, long_desc, rating, is_featured, is_loved, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.platform)
        .bind(&product.delivery)
        .bind(product.old_price_cents)
        .bind(product.price_cents)
        .bind(product.save_percent)
        .bind(&product.image)
        .bind(&product.short_desc)
        .bind(to_json(&product.long_desc)?)
        .bind(product.rating)
        .bind(product.is_featured)
        .bind(product.is_loved)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("id", &product.id),
            other => other,
        })?;

        Ok(product)
    }

    /// Replaces an existing product's fields. The id and creation time stay.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                brand = ?4,
                platform = ?5,
                delivery = ?6,
                old_price_cents = ?7,
                price_cents = ?8,
                save_percent = ?9,
                image = ?10,
                short_desc = ?11,
                long_desc = ?12,
                rating = ?13,
                is_featured = ?14,
                is_loved = ?15
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft.name.trim())
        .bind(draft.category.trim())
        .bind(draft.brand.trim())
        .bind(&draft.platform)
        .bind(&draft.delivery)
        .bind(draft.old_price_cents)
        .bind(draft.price_cents)
        .bind(draft.resolved_save_percent())
        .bind(&draft.image)
        .bind(&draft.short_desc)
        .bind(to_json(&draft.long_desc)?)
        .bind(draft.rating)
        .bind(draft.is_featured)
        .bind(draft.is_loved)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Past orders keep their item snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn draft(name: &str, category: &str, brand: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            brand: brand.to_string(),
            old_price_cents: 5000,
            price_cents: 2500,
            short_desc: format!("{brand} protection"),
            long_desc: vec!["One".to_string(), "Two".to_string()],
            rating: 4.5,
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_resolved_save_percent() {
        let d = draft("A", "Antivirus", "Acme");
        assert_eq!(d.resolved_save_percent(), 50);

        let d = ProductDraft {
            old_price_cents: 3000,
            price_cents: 2000,
            ..ProductDraft::default()
        };
        assert_eq!(d.resolved_save_percent(), 33);

        let d = ProductDraft {
            save_percent: Some(80),
            ..ProductDraft::default()
        };
        assert_eq!(d.resolved_save_percent(), 80);
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft("Norton 360", "Antivirus", "Norton").validate().is_ok());
        assert!(draft("", "Antivirus", "Norton").validate().is_err());
        assert!(draft("Norton 360", " ", "Norton").validate().is_err());

        let mut bad = draft("Norton 360", "Antivirus", "Norton");
        bad.price_cents = -1;
        assert!(bad.validate().is_err());

        let mut bad = draft("Norton 360", "Antivirus", "Norton");
        bad.id = Some("has space".to_string());
        assert!(bad.validate().is_err());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let db = test_db().await;
        let repo = db.products();

        let first = repo.insert(&draft("Alpha", "Antivirus", "Acme")).await.unwrap();
        let second = repo.insert(&draft("Beta", "Antivirus", "Acme")).await.unwrap();
        assert_eq!(first.id, "p1");
        assert_eq!(second.id, "p2");

        let mut explicit = draft("Gamma", "VPN", "Acme");
        explicit.id = Some("p10".to_string());
        repo.insert(&explicit).await.unwrap();
        assert_eq!(repo.next_id().await.unwrap(), "p11");

        let err = repo.insert(&explicit).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_get_round_trips_fields() {
        let db = test_db().await;
        let repo = db.products();

        let inserted = repo.insert(&draft("Alpha", "Antivirus", "Acme")).await.unwrap();
        let loaded = repo.get_by_id(&inserted.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Alpha");
        assert_eq!(loaded.long_desc, vec!["One", "Two"]);
        assert_eq!(loaded.price_cents, 2500);
        assert_eq!(loaded.save_percent, 50);
        assert!(repo.get_by_id("p404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&draft("Zeta Shield", "Antivirus", "Norton")).await.unwrap();
        repo.insert(&draft("Alpha Guard", "VPN", "McAfee")).await.unwrap();
        repo.insert(&draft("Beta Lock", "Antivirus", "Kaspersky")).await.unwrap();

        // Matches brand, sorted by name
        let hits = repo.search("norTON").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Zeta Shield");

        // Matches category
        let hits = repo.search("antivirus").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta Lock", "Zeta Shield"]);

        // Empty query lists everything
        assert_eq!(repo.search("   ").await.unwrap().len(), 3);

        // Wildcards match literally
        assert!(repo.search("%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggest_prefix_and_limits() {
        let db = test_db().await;
        let repo = db.products();

        for i in 0..8 {
            repo.insert(&draft(&format!("Norton Edition {i}"), "Antivirus", "Norton"))
                .await
                .unwrap();
        }
        repo.insert(&draft("Total Norton", "Antivirus", "Gen")).await.unwrap();

        assert!(repo.suggest("n").await.unwrap().is_empty());
        assert!(repo.suggest(" n ").await.unwrap().is_empty());

        let hits = repo.suggest("no").await.unwrap();
        assert_eq!(hits.len(), 6);
        // Prefix only: "Total Norton" from brand "Gen" never matches
        assert!(hits.iter().all(|s| s.name.starts_with("Norton")));
    }

    #[tokio::test]
    async fn test_featured_loved_related() {
        let db = test_db().await;
        let repo = db.products();

        let mut a = draft("A", "Antivirus", "Acme");
        a.is_featured = true;
        a.is_loved = true;
        a.rating = 3.0;
        let a = repo.insert(&a).await.unwrap();

        let mut b = draft("B", "Antivirus", "Acme");
        b.is_loved = true;
        b.rating = 5.0;
        repo.insert(&b).await.unwrap();

        repo.insert(&draft("C", "VPN", "Acme")).await.unwrap();

        let featured = repo.featured(HOME_STRIP_LIMIT).await.unwrap();
        assert_eq!(featured.len(), 1);

        let loved = repo.loved(HOME_STRIP_LIMIT).await.unwrap();
        assert_eq!(loved[0].name, "B");

        let related = repo.related(&a, RELATED_LIMIT).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].name, "B");
    }

    #[tokio::test]
    async fn test_refs_for_skips_unknown_ids() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&draft("A", "Antivirus", "Acme")).await.unwrap();
        repo.insert(&draft("B", "VPN", "Acme")).await.unwrap();

        let refs = repo
            .refs_for(&["p1".to_string(), "p2".to_string(), "p99".to_string()])
            .await
            .unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs
            .iter()
            .any(|r| r.product_id == "p2" && r.category == "VPN"));

        assert!(repo.refs_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(&draft("A", "Antivirus", "Acme")).await.unwrap();

        let mut changed = draft("A Pro", "VPN", "Acme");
        changed.price_cents = 1999;
        let updated = repo.update(&product.id, &changed).await.unwrap();
        assert_eq!(updated.name, "A Pro");
        assert_eq!(updated.category, "VPN");
        assert_eq!(updated.created_at, product.created_at);

        assert!(matches!(
            repo.update("p404", &changed).await,
            Err(DbError::NotFound { .. })
        ));

        repo.delete(&product.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
