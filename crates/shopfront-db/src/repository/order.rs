//! # Order Repository
//!
//! Persists captured orders together with their item snapshots.
//!
//! ## Insert Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT orders            (payment_order_id UNIQUE)                   │
//! │    INSERT order_items × N   (position keeps the cart order)             │
//! │    UPDATE coupons SET used_count = used_count + 1   (if a code applied) │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls the whole order back.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use shopfront_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "id, user_id, customer_name, customer_email, payment_order_id, \
     payer_id, status, subtotal_cents, discount_cents, total_cents, currency, coupon_code, \
     shipping_address, created_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: Option<String>,
    customer_name: String,
    customer_email: String,
    payment_order_id: String,
    payer_id: String,
    status: OrderStatus,
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    currency: String,
    coupon_code: Option<String>,
    shipping_address: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        Ok(Order {
            shipping_address: from_json(&self.shipping_address)?,
            id: self.id,
            user_id: self.user_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            payment_order_id: self.payment_order_id,
            payer_id: self.payer_id,
            status: self.status,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            currency: self.currency,
            coupon_code: self.coupon_code,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    image: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            name: row.name,
            price_cents: row.price_cents,
            quantity: row.quantity,
            image: row.image,
        }
    }
}

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Records a captured order and its items, and counts the coupon use.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - this payment order was already recorded
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            payment_order_id = %order.payment_order_id,
            items = order.items.len(),
            "Inserting order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, customer_name, customer_email, payment_order_id,
                payer_id, status, subtotal_cents, discount_cents, total_cents,
                currency, coupon_code, shipping_address, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.payment_order_id)
        .bind(&order.payer_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(&order.currency)
        .bind(&order.coupon_code)
        .bind(to_json(&order.shipping_address)?)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("payment_order_id", &order.payment_order_id)
            }
            other => other,
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, name, price_cents, quantity, image
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(&item.image)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(code) = &order.coupon_code {
            sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE code = ?1")
                .bind(code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %order.id,
            total_cents = order.total_cents,
            status = ?order.status,
            "Order recorded"
        );
        Ok(())
    }

    /// Lists orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(&row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_items(row).await
    }

    /// Looks an order up by the payment provider's order id.
    pub async fn get_by_payment_order_id(&self, payment_order_id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_order_id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(payment_order_id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_items(row).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn with_items(&self, row: Option<OrderRow>) -> DbResult<Option<Order>> {
        match row {
            Some(row) => {
                let items = self.items_for(&row.id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn items_for(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT product_id, name, price_cents, quantity, image
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::Duration;
    use shopfront_core::coupon::{validate_coupon, CouponDraft};
    use shopfront_core::ShippingAddress;

    fn order(payment_order_id: &str, coupon_code: Option<&str>) -> Order {
        Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            payment_order_id: payment_order_id.to_string(),
            payer_id: "PAYER1".to_string(),
            status: OrderStatus::Completed,
            subtotal_cents: 5000,
            discount_cents: 500,
            total_cents: 4500,
            currency: "USD".to_string(),
            coupon_code: coupon_code.map(str::to_string),
            items: vec![
                OrderItem {
                    product_id: "p2".to_string(),
                    name: "Second".to_string(),
                    price_cents: 2000,
                    quantity: 1,
                    image: None,
                },
                OrderItem {
                    product_id: "p1".to_string(),
                    name: "First".to_string(),
                    price_cents: 3000,
                    quantity: 1,
                    image: Some("/image/p1.png".to_string()),
                },
            ],
            shipping_address: ShippingAddress {
                full_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..ShippingAddress::default()
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_snapshot() {
        let db = test_db().await;
        let repo = db.orders();

        let placed = order("PAY-1", None);
        repo.insert(&placed).await.unwrap();

        let loaded = repo.get_by_payment_order_id("PAY-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, placed.id);
        assert_eq!(loaded.status, OrderStatus::Completed);
        assert_eq!(loaded.total_cents, 4500);
        assert_eq!(loaded.shipping_address.full_name, "Ada");
        // Cart order is preserved
        assert_eq!(loaded.items[0].product_id, "p2");
        assert_eq!(loaded.items[1].image.as_deref(), Some("/image/p1.png"));

        assert!(repo.get_by_id(&placed.id).await.unwrap().is_some());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_payment_order_twice_is_a_conflict() {
        let db = test_db().await;
        let repo = db.orders();

        repo.insert(&order("PAY-1", None)).await.unwrap();
        let err = repo.insert(&order("PAY-1", None)).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_counts_coupon_use() {
        let db = test_db().await;
        let coupon = validate_coupon(CouponDraft {
            code: "WELCOME10".to_string(),
            discount_value: 10.0,
            ..CouponDraft::default()
        })
        .unwrap();
        db.coupons().insert(&coupon).await.unwrap();

        db.orders().insert(&order("PAY-1", Some("WELCOME10"))).await.unwrap();
        db.orders().insert(&order("PAY-2", Some("WELCOME10"))).await.unwrap();

        let reloaded = db.coupons().get_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(reloaded.used_count, 2);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = test_db().await;
        let repo = db.orders();

        let mut older = order("PAY-OLD", None);
        older.created_at = Utc::now() - Duration::hours(1);
        repo.insert(&older).await.unwrap();
        repo.insert(&order("PAY-NEW", None)).await.unwrap();

        let orders = repo.list().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].payment_order_id, "PAY-NEW");
        assert_eq!(orders[1].items.len(), 2);
    }
}
