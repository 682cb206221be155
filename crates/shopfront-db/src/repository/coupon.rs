//! # Coupon Repository
//!
//! Database operations for coupons.
//!
//! ## Load-Time Validation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  coupons row                                                            │
//! │  discount_type='percentage', discount_value=1000, applies_to='all' ...  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Discount::from_stored / CouponScope::from_str / JSON target lists      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Coupon::check_invariants()                                             │
//! │       │                                                                 │
//! │       ├── ok ──────► Coupon handed to the pricing adapter               │
//! │       └── fails ───► DbError::InvalidRecord (never priced)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Codes are stored upper-case; lookups upper-case their input.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use shopfront_core::coupon::{Coupon, Discount};
use shopfront_core::Money;

const COUPON_COLUMNS: &str = "code, discount_type, discount_value, min_order_cents, applies_to, \
     target_product_ids, target_category_names, usage_limit, used_count, is_active, expires_at";

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    code: String,
    discount_type: String,
    discount_value: i64,
    min_order_cents: i64,
    applies_to: String,
    target_product_ids: String,
    target_category_names: String,
    usage_limit: i64,
    used_count: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> DbResult<Self> {
        let invalid = |e: shopfront_core::ValidationError| DbError::invalid("Coupon", e);

        let coupon = Coupon {
            discount: Discount::from_stored(&row.discount_type, row.discount_value)
                .map_err(invalid)?,
            min_order: Money::from_cents(row.min_order_cents),
            applies_to: row.applies_to.parse().map_err(invalid)?,
            target_product_ids: from_json(&row.target_product_ids)?,
            target_category_names: from_json(&row.target_category_names)?,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            is_active: row.is_active,
            expires_at: row.expires_at,
            code: row.code,
        };
        coupon.check_invariants().map_err(invalid)?;
        Ok(coupon)
    }
}

/// Repository for coupons.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Loads a coupon by code (case-insensitive).
    ///
    /// ## Returns
    /// * `Ok(Some(Coupon))` - Found and valid
    /// * `Ok(None)` - No such code
    /// * `Err(DbError::InvalidRecord)` - Row exists but is malformed
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let code = code.trim().to_uppercase();

        debug!(code = %code, "Loading coupon");

        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?1");
        let row = sqlx::query_as::<_, CouponRow>(&sql)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Lists coupons, newest first. Malformed rows are logged and skipped.
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC, code");
        let rows = sqlx::query_as::<_, CouponRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut coupons = Vec::with_capacity(rows.len());
        for row in rows {
            let code = row.code.clone();
            match Coupon::try_from(row) {
                Ok(coupon) => coupons.push(coupon),
                Err(e) => warn!(code = %code, error = %e, "Skipping malformed coupon"),
            }
        }
        Ok(coupons)
    }

    /// Inserts a validated coupon.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                code, discount_type, discount_value, min_order_cents, applies_to,
                target_product_ids, target_category_names, usage_limit, used_count,
                is_active, expires_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&coupon.code)
        .bind(coupon.discount.kind())
        .bind(coupon.discount.stored_value())
        .bind(coupon.min_order.cents())
        .bind(coupon.applies_to.as_str())
        .bind(to_json(&coupon.target_product_ids)?)
        .bind(to_json(&coupon.target_category_names)?)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.is_active)
        .bind(coupon.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &coupon.code),
            other => other,
        })?;

        Ok(())
    }

    /// Enables or disables a coupon.
    pub async fn set_active(&self, code: &str, active: bool) -> DbResult<()> {
        let code = code.trim().to_uppercase();

        debug!(code = %code, active, "Setting coupon active flag");

        let result = sqlx::query("UPDATE coupons SET is_active = ?2 WHERE code = ?1")
            .bind(&code)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", code));
        }
        Ok(())
    }

    pub async fn delete(&self, code: &str) -> DbResult<()> {
        let code = code.trim().to_uppercase();

        let result = sqlx::query("DELETE FROM coupons WHERE code = ?1")
            .bind(&code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", code));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use shopfront_core::coupon::{validate_coupon, CouponDraft, CouponScope};
    use shopfront_core::types::Percentage;

    fn coupon(code: &str) -> Coupon {
        validate_coupon(CouponDraft {
            code: code.to_string(),
            discount_type: "percentage".to_string(),
            discount_value: 12.5,
            min_order_amount: 20.0,
            applies_to: "categories".to_string(),
            target_category_names: vec!["Antivirus".to_string()],
            usage_limit: 5,
            ..CouponDraft::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_by_code() {
        let db = test_db().await;
        let repo = db.coupons();

        repo.insert(&coupon("spring")).await.unwrap();

        let loaded = repo.get_by_code(" Spring ").await.unwrap().unwrap();
        assert_eq!(loaded.code, "SPRING");
        assert_eq!(loaded.discount, Discount::Percentage(Percentage::from_bps(1250)));
        assert_eq!(loaded.min_order, Money::from_cents(2000));
        assert_eq!(loaded.applies_to, CouponScope::Categories);
        assert_eq!(loaded.target_category_names, vec!["Antivirus"]);
        assert_eq!(loaded.usage_limit, 5);

        assert!(repo.get_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code() {
        let db = test_db().await;
        let repo = db.coupons();

        repo.insert(&coupon("DUP")).await.unwrap();
        assert!(repo.insert(&coupon("DUP")).await.unwrap_err().is_unique_violation());
    }

    #[tokio::test]
    async fn test_malformed_row_is_rejected_on_load() {
        let db = test_db().await;
        let repo = db.coupons();

        repo.insert(&coupon("GOOD")).await.unwrap();
        // Written around the admin API
        sqlx::query(
            "INSERT INTO coupons (code, discount_type, discount_value, created_at) \
             VALUES ('BAD CODE', 'fixed', 100, '2025-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(matches!(
            repo.get_by_code("bad code").await,
            Err(DbError::InvalidRecord { .. })
        ));

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, "GOOD");
    }

    #[tokio::test]
    async fn test_set_active_and_delete() {
        let db = test_db().await;
        let repo = db.coupons();

        repo.insert(&coupon("FLIP")).await.unwrap();
        repo.set_active("flip", false).await.unwrap();
        assert!(!repo.get_by_code("FLIP").await.unwrap().unwrap().is_active);

        repo.delete("FLIP").await.unwrap();
        assert!(repo.get_by_code("FLIP").await.unwrap().is_none());
        assert!(matches!(
            repo.set_active("FLIP", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
