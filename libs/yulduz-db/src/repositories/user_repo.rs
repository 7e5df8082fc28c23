use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_tg_id(&self, tg_id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE tg_id = $1")
            .bind(tg_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by TG ID")
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")
    }

    /// Registers a user exactly once. A concurrent or repeated registration
    /// for the same tg_id returns the already-stored record untouched.
    pub async fn create(
        &self,
        tg_id: i64,
        phone_number: &str,
        first_name: &str,
        username: &str,
        referred_by: Option<i64>,
    ) -> Result<User> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (tg_id, phone_number, first_name, username, referred_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tg_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(tg_id)
        .bind(phone_number)
        .bind(first_name)
        .bind(username)
        .bind(referred_by)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to create user")?;

        if let Some(user) = inserted {
            return Ok(user);
        }
        self.get_by_tg_id(tg_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} missing after insert conflict", tg_id))
    }

    /// Credits stars to a user's bonus balance and returns the fresh record.
    pub async fn add_stars(&self, tg_id: i64, amount: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET stars_earned = stars_earned + $1 WHERE tg_id = $2 RETURNING *",
        )
        .bind(amount)
        .bind(tg_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to adjust user stars")
    }
}
