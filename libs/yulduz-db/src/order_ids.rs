use std::future::Future;

use anyhow::{Context, Result};
use rand::Rng;
use sqlx::PgPool;
use tracing::warn;

const ORDER_SEQ: &str = "order_seq";
const MAX_PROBE_ATTEMPTS: u32 = 10;

/// External order references are 5 zero-padded decimal digits. Values past
/// 99999 widen the string instead of wrapping; that is the capacity limit.
pub fn format_order_id(value: i64) -> String {
    format!("{:05}", value)
}

/// Draws random candidates from the 5-digit space until `taken` clears one,
/// giving up after a bounded number of attempts.
async fn probe_free_id<F, Fut>(mut taken: F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for _ in 0..MAX_PROBE_ATTEMPTS {
        let candidate = format_order_id(rand::rng().random_range(0..=99_999));
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    Err(anyhow::anyhow!(
        "No free order id after {} random probes",
        MAX_PROBE_ATTEMPTS
    ))
}

#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    pool: PgPool,
}

impl OrderIdGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Next unique order reference. The sequence counter is the primary
    /// source; when its increment fails the generator falls back to a
    /// bounded random probe of the 5-digit space.
    pub async fn next(&self) -> Result<String> {
        match self.next_from_counter().await {
            Ok(value) => Ok(format_order_id(value)),
            Err(e) => {
                warn!("Order counter unavailable, probing for a free id: {:#}", e);
                self.next_from_probe().await
            }
        }
    }

    async fn next_from_counter(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO counters (name, value) VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET value = counters.value + 1
            RETURNING value
            "#,
        )
        .bind(ORDER_SEQ)
        .fetch_one(&self.pool)
        .await
        .context("Failed to increment order counter")
    }

    async fn next_from_probe(&self) -> Result<String> {
        let pool = &self.pool;
        probe_free_id(|candidate| async move {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM orders WHERE order_id = $1)",
            )
            .bind(&candidate)
            .fetch_one(pool)
            .await
            .context("Failed to probe order id")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn order_ids_are_zero_padded_to_five_digits() {
        assert_eq!(format_order_id(1), "00001");
        assert_eq!(format_order_id(42), "00042");
        assert_eq!(format_order_id(99_999), "99999");
    }

    #[test]
    fn exhausted_counter_space_widens_instead_of_wrapping() {
        assert_eq!(format_order_id(100_000), "100000");
    }

    #[tokio::test]
    async fn probe_returns_the_first_free_candidate() {
        let id = probe_free_id(|_| async { Ok(false) }).await.unwrap();
        assert_eq!(id.len(), 5);
        assert!(id.bytes().all(|b| b.is_ascii_digit()));
    }

    #[tokio::test]
    async fn probe_gives_up_after_the_attempt_bound() {
        let attempts = Cell::new(0u32);
        let result = probe_free_id(|_| {
            attempts.set(attempts.get() + 1);
            async { Ok(true) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.get(), MAX_PROBE_ATTEMPTS);
    }

    #[tokio::test]
    async fn probe_surfaces_lookup_failures() {
        let result =
            probe_free_id(|_| async { Err(anyhow::anyhow!("connection reset")) }).await;
        assert!(result.is_err());
    }
}
