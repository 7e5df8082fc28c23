use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::{NewOrder, Order};
use crate::order_ids::OrderIdGenerator;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("order not found")]
    NotFound,
    #[error("transaction {0} is already applied to another order")]
    DuplicateTransaction(String),
    #[error("order {0} is no longer pending")]
    NotPending(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a pending order with a freshly generated external reference.
    /// Nothing is persisted when id generation fails.
    pub async fn create(&self, ids: &OrderIdGenerator, new: NewOrder) -> Result<Order> {
        let order_id = ids.next().await?;
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, amount, order_type, stars_count, months, recipient, order_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.amount)
        .bind(&new.order_type)
        .bind(new.stars_count)
        .bind(new.months)
        .bind(&new.recipient)
        .bind(&order_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert order")
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_transaction_id(&self, tx_id: &str) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE transaction_id = $1")
            .bind(tx_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Marks a pending order completed and stamps the provider transaction id
    /// in one conditional update. Re-applying the same transaction to the same
    /// already-completed order is a no-op success (provider retries); the same
    /// transaction on any other order is a conflict. The partial unique index
    /// on transaction_id closes the race between concurrent attachments.
    pub async fn attach_transaction(
        &self,
        order_id: &str,
        tx_id: &str,
    ) -> Result<Order, LedgerError> {
        if let Some(existing) = self.find_by_transaction_id(tx_id).await? {
            if existing.order_id == order_id && existing.paid {
                return Ok(existing);
            }
            return Err(LedgerError::DuplicateTransaction(tx_id.to_string()));
        }

        let updated = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET transaction_id = $2, paid = TRUE
            WHERE order_id = $1 AND paid = FALSE AND transaction_id IS NULL
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(tx_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerError::DuplicateTransaction(tx_id.to_string())
            } else {
                LedgerError::Db(e)
            }
        })?;

        if let Some(order) = updated {
            return Ok(order);
        }

        match self.find_by_order_id(order_id).await? {
            None => Err(LedgerError::NotFound),
            // Lost a race against our own retry: same outcome, report success.
            Some(o) if o.paid && o.transaction_id.as_deref() == Some(tx_id) => Ok(o),
            Some(o) => Err(LedgerError::NotPending(o.order_id)),
        }
    }

    /// Completed orders created within `[from, to)`, streamed lazily in
    /// creation order.
    pub fn statement(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> BoxStream<'_, Result<Order, sqlx::Error>> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE paid = TRUE AND created_at >= $1 AND created_at < $2
            ORDER BY created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch(&self.pool)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list recent orders")
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
