use anyhow::Result;

use yulduz_db::models::{NewOrder, Order};
use yulduz_db::sqlx::PgPool;
use yulduz_db::order_ids::OrderIdGenerator;
use yulduz_db::repositories::OrderRepository;

/// Ledger entry creation for completed purchase funnels.
#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    ids: OrderIdGenerator,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            ids: OrderIdGenerator::new(pool),
        }
    }

    pub async fn place(&self, new: NewOrder) -> Result<Order> {
        self.orders.create(&self.ids, new).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>> {
        self.orders.recent(limit).await
    }
}
