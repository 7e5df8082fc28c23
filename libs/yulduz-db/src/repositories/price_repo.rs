use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::models::{PriceEntry, PriceType};

#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<PriceEntry>> {
        sqlx::query_as::<_, PriceEntry>("SELECT price_type, value FROM prices")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch prices")
    }

    pub async fn get(&self, price_type: PriceType) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT value FROM prices WHERE price_type = $1")
            .bind(price_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch price")
    }

    pub async fn upsert(&self, price_type: PriceType, value: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prices (price_type, value) VALUES ($1, $2)
            ON CONFLICT (price_type) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(price_type.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .context("Failed to upsert price")?;
        Ok(())
    }

    /// Inserts the hardcoded defaults for any SKU missing from the catalog.
    /// Existing rows are left untouched.
    pub async fn seed_defaults(&self) -> Result<()> {
        for pt in PriceType::ALL {
            let inserted = sqlx::query(
                "INSERT INTO prices (price_type, value) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(pt.as_str())
            .bind(pt.default_value())
            .execute(&self.pool)
            .await
            .context("Failed to seed default price")?;
            if inserted.rows_affected() > 0 {
                info!("Seeded default price {} = {}", pt.as_str(), pt.default_value());
            }
        }
        Ok(())
    }
}
