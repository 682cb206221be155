//! # Contact Repository
//!
//! The admin inbox of messages sent through the public contact form.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::ContactMessage;

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: String,
    sender_email: String,
    subject: String,
    message: String,
    is_read: bool,
    replied: bool,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactMessage {
    fn from(row: ContactRow) -> Self {
        ContactMessage {
            id: row.id,
            sender_email: row.sender_email,
            subject: row.subject,
            message: row.message,
            read: row.is_read,
            replied: row.replied,
            created_at: row.created_at,
        }
    }
}

/// Repository for contact messages.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    /// Stores a new, unread message. The caller validates the fields.
    pub async fn insert(
        &self,
        sender_email: &str,
        subject: &str,
        message: &str,
    ) -> DbResult<ContactMessage> {
        let contact = ContactMessage {
            id: generate_id(),
            sender_email: sender_email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            read: false,
            replied: false,
            created_at: Utc::now(),
        };

        debug!(id = %contact.id, "Storing contact message");

        sqlx::query(
            "INSERT INTO contact_messages (id, sender_email, subject, message, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&contact.id)
        .bind(&contact.sender_email)
        .bind(&contact.subject)
        .bind(&contact.message)
        .bind(contact.created_at)
        .execute(&self.pool)
        .await?;

        Ok(contact)
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<ContactMessage>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT id, sender_email, subject, message, is_read, replied, created_at \
             FROM contact_messages ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ContactMessage::from).collect())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<ContactMessage>> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT id, sender_email, subject, message, is_read, replied, created_at \
             FROM contact_messages WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContactMessage::from))
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<()> {
        self.set_flag(id, "UPDATE contact_messages SET is_read = 1 WHERE id = ?1")
            .await
    }

    /// Marks a message replied (which also marks it read).
    pub async fn mark_replied(&self, id: &str) -> DbResult<()> {
        self.set_flag(
            id,
            "UPDATE contact_messages SET replied = 1, is_read = 1 WHERE id = ?1",
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        self.set_flag(id, "DELETE FROM contact_messages WHERE id = ?1")
            .await
    }

    async fn set_flag(&self, id: &str, sql: &str) -> DbResult<()> {
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ContactMessage", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_inbox_flow() {
        let db = test_db().await;
        let repo = db.contacts();

        let msg = repo
            .insert("ada@example.com", "Licence key", "My key didn't arrive.")
            .await
            .unwrap();
        assert!(!msg.read);

        repo.mark_read(&msg.id).await.unwrap();
        let loaded = repo.get(&msg.id).await.unwrap().unwrap();
        assert!(loaded.read);
        assert!(!loaded.replied);

        repo.mark_replied(&msg.id).await.unwrap();
        assert!(repo.get(&msg.id).await.unwrap().unwrap().replied);

        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(&msg.id).await.unwrap();
        assert!(repo.get(&msg.id).await.unwrap().is_none());
        assert!(matches!(repo.mark_read(&msg.id).await, Err(DbError::NotFound { .. })));
    }
}
