use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use yulduz_db::models::Order;
use yulduz_db::repositories::{LedgerError, OrderRepository};
use yulduz_db::sqlx::PgPool;

/// Order-ledger operations the webhook dispatcher needs. A seam so the
/// dispatcher can be exercised against an in-memory ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>>;
    async fn find_by_transaction_id(&self, tx_id: &str) -> Result<Option<Order>>;
    async fn attach_transaction(&self, order_id: &str, tx_id: &str)
        -> Result<Order, LedgerError>;
    /// Completed orders created within `[from, to)`.
    async fn statement(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>>;
}

#[derive(Clone)]
pub struct PgLedger {
    orders: OrderRepository,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.find_by_order_id(order_id).await?)
    }

    async fn find_by_transaction_id(&self, tx_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.find_by_transaction_id(tx_id).await?)
    }

    async fn attach_transaction(
        &self,
        order_id: &str,
        tx_id: &str,
    ) -> Result<Order, LedgerError> {
        self.orders.attach_transaction(order_id, tx_id).await
    }

    async fn statement(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>> {
        let orders = self.orders.statement(from, to).try_collect().await?;
        Ok(orders)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// In-memory ledger with the same attachment semantics as the Postgres
    /// one, for dispatcher tests.
    #[derive(Default)]
    pub struct MemoryLedger {
        orders: Mutex<Vec<Order>>,
    }

    impl MemoryLedger {
        pub fn with_orders(orders: Vec<Order>) -> Self {
            Self {
                orders: Mutex::new(orders),
            }
        }
    }

    #[async_trait]
    impl Ledger for MemoryLedger {
        async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders.iter().find(|o| o.order_id == order_id).cloned())
        }

        async fn find_by_transaction_id(&self, tx_id: &str) -> Result<Option<Order>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .find(|o| o.transaction_id.as_deref() == Some(tx_id))
                .cloned())
        }

        async fn attach_transaction(
            &self,
            order_id: &str,
            tx_id: &str,
        ) -> Result<Order, LedgerError> {
            let mut orders = self.orders.lock().unwrap();

            if let Some(existing) = orders
                .iter()
                .find(|o| o.transaction_id.as_deref() == Some(tx_id))
            {
                if existing.order_id == order_id && existing.paid {
                    return Ok(existing.clone());
                }
                return Err(LedgerError::DuplicateTransaction(tx_id.to_string()));
            }

            match orders.iter_mut().find(|o| o.order_id == order_id) {
                None => Err(LedgerError::NotFound),
                Some(o) if !o.paid && o.transaction_id.is_none() => {
                    o.transaction_id = Some(tx_id.to_string());
                    o.paid = true;
                    Ok(o.clone())
                }
                Some(o) => Err(LedgerError::NotPending(o.order_id.clone())),
            }
        }

        async fn statement(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| o.paid && o.created_at >= from && o.created_at < to)
                .cloned()
                .collect())
        }
    }
}
