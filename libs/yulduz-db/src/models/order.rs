use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ORDER_TYPE_STARS: &str = "star_purchase";
pub const ORDER_TYPE_PREMIUM: &str = "premium_purchase";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Amount in major currency units (so'm).
    pub amount: i64,
    pub order_type: String,
    pub stars_count: Option<i64>,
    pub months: Option<i64>,
    pub recipient: String,
    pub transaction_id: Option<String>,
    pub paid: bool,
    /// External 5-digit zero-padded order reference, distinct from `id`.
    pub order_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub amount: i64,
    pub order_type: String,
    pub stars_count: Option<i64>,
    pub months: Option<i64>,
    pub recipient: String,
}

impl NewOrder {
    pub fn stars(user_id: i64, stars: i64, amount: i64, recipient: String) -> Self {
        Self {
            user_id,
            amount,
            order_type: ORDER_TYPE_STARS.to_string(),
            stars_count: Some(stars),
            months: None,
            recipient,
        }
    }

    pub fn premium(user_id: i64, months: i64, amount: i64, recipient: String) -> Self {
        Self {
            user_id,
            amount,
            order_type: ORDER_TYPE_PREMIUM.to_string(),
            stars_count: None,
            months: Some(months),
            recipient,
        }
    }
}
