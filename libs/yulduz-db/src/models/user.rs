use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub tg_id: i64,
    pub phone_number: String,
    pub first_name: String,
    pub username: String,
    /// tg_id of the user whose referral link brought this one in.
    pub referred_by: Option<i64>,
    pub stars_earned: i64,
    pub created_at: DateTime<Utc>,
}
