//! # Setting Repository
//!
//! Store settings as key → JSON value rows, resolved into
//! [`StoreSettings`] on load.

use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::to_json;
use shopfront_core::settings::StoreSettings;

/// Repository for store settings.
#[derive(Debug, Clone)]
pub struct SettingRepository {
    pool: SqlitePool,
}

impl SettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingRepository { pool }
    }

    /// Raw stored entries. Values that aren't valid JSON are logged and
    /// skipped.
    pub async fn entries(&self) -> DbResult<Vec<(String, Value)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for (key, raw) in rows {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => entries.push((key, value)),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable setting"),
            }
        }
        Ok(entries)
    }

    /// Resolved settings (defaults for anything missing or malformed).
    pub async fn load(&self) -> DbResult<StoreSettings> {
        Ok(StoreSettings::from_entries(self.entries().await?))
    }

    /// Inserts or replaces the given entries in one transaction.
    pub async fn upsert_many(&self, entries: &[(String, Value)]) -> DbResult<()> {
        debug!(count = entries.len(), "Saving settings");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        let now = Utc::now();

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(to_json(value)?)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_defaults_then_overrides() {
        let db = test_db().await;
        let repo = db.settings();

        assert_eq!(repo.load().await.unwrap(), StoreSettings::default());

        repo.upsert_many(&[
            ("currency".to_string(), json!("EUR")),
            ("themeColor".to_string(), json!("#000000")),
        ])
        .await
        .unwrap();
        repo.upsert_many(&[("currency".to_string(), json!("GBP"))])
            .await
            .unwrap();

        let settings = repo.load().await.unwrap();
        assert_eq!(settings.currency, "GBP");
        assert_eq!(settings.theme_color, "#000000");
        assert_eq!(repo.entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_value_is_skipped() {
        let db = test_db().await;
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES ('currency', 'not json', '')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings.currency, "USD");
    }
}
