use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use yulduz_db::models::{PriceEntry, PriceType};
use yulduz_db::repositories::PriceRepository;

/// Catalog storage operations, a seam so pricing logic can be exercised
/// against an in-memory source.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_all(&self) -> Result<Vec<PriceEntry>>;
    async fn get(&self, price_type: PriceType) -> Result<Option<i64>>;
    async fn upsert(&self, price_type: PriceType, value: i64) -> Result<()>;
    async fn seed_defaults(&self) -> Result<()>;
}

#[async_trait]
impl PriceSource for PriceRepository {
    async fn get_all(&self) -> Result<Vec<PriceEntry>> {
        PriceRepository::get_all(self).await
    }

    async fn get(&self, price_type: PriceType) -> Result<Option<i64>> {
        PriceRepository::get(self, price_type).await
    }

    async fn upsert(&self, price_type: PriceType, value: i64) -> Result<()> {
        PriceRepository::upsert(self, price_type, value).await
    }

    async fn seed_defaults(&self) -> Result<()> {
        PriceRepository::seed_defaults(self).await
    }
}

/// Price catalog lookups with hardcoded fallbacks for missing rows.
#[derive(Clone)]
pub struct CatalogService {
    prices: Arc<dyn PriceSource>,
}

impl CatalogService {
    pub fn new(prices: impl PriceSource + 'static) -> Self {
        Self {
            prices: Arc::new(prices),
        }
    }

    pub async fn seed_defaults(&self) -> Result<()> {
        self.prices.seed_defaults().await
    }

    /// Every SKU with its current price; defaults fill any gap.
    pub async fn board(&self) -> Result<HashMap<PriceType, i64>> {
        let mut board: HashMap<PriceType, i64> = PriceType::ALL
            .into_iter()
            .map(|pt| (pt, pt.default_value()))
            .collect();
        for entry in self.prices.get_all().await? {
            if let Some(pt) = PriceType::from_str(&entry.price_type) {
                board.insert(pt, entry.value);
            }
        }
        Ok(board)
    }

    pub async fn price_of(&self, price_type: PriceType) -> Result<i64> {
        Ok(self
            .prices
            .get(price_type)
            .await?
            .unwrap_or_else(|| price_type.default_value()))
    }

    /// Total for a star purchase: quantity times the per-star price.
    pub async fn star_total(&self, count: i64) -> Result<i64> {
        Ok(count * self.price_of(PriceType::StarPerUnit).await?)
    }

    pub async fn set_price(&self, price_type: PriceType, value: i64) -> Result<()> {
        self.prices.upsert(price_type, value).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryPrices {
        rows: Mutex<HashMap<PriceType, i64>>,
    }

    #[async_trait]
    impl PriceSource for MemoryPrices {
        async fn get_all(&self) -> Result<Vec<PriceEntry>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .map(|(pt, value)| PriceEntry {
                    price_type: pt.as_str().to_string(),
                    value: *value,
                })
                .collect())
        }

        async fn get(&self, price_type: PriceType) -> Result<Option<i64>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.get(&price_type).copied())
        }

        async fn upsert(&self, price_type: PriceType, value: i64) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            rows.insert(price_type, value);
            Ok(())
        }

        async fn seed_defaults(&self) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            for pt in PriceType::ALL {
                rows.entry(pt).or_insert_with(|| pt.default_value());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_rows_fall_back_to_defaults() {
        let catalog = CatalogService::new(MemoryPrices::default());
        assert_eq!(
            catalog.price_of(PriceType::Premium6Months).await.unwrap(),
            240_000
        );

        let board = catalog.board().await.unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board[&PriceType::StarPerUnit], 240);
    }

    #[tokio::test]
    async fn price_updates_are_visible_to_later_lookups() {
        let catalog = CatalogService::new(MemoryPrices::default());
        catalog
            .set_price(PriceType::Premium3Months, 199_000)
            .await
            .unwrap();

        assert_eq!(
            catalog.price_of(PriceType::Premium3Months).await.unwrap(),
            199_000
        );
        let board = catalog.board().await.unwrap();
        assert_eq!(board[&PriceType::Premium3Months], 199_000);
        // Untouched SKUs keep their defaults.
        assert_eq!(board[&PriceType::Premium12Months], 405_000);
    }

    #[tokio::test]
    async fn seeding_never_overwrites_an_existing_price() {
        let catalog = CatalogService::new(MemoryPrices::default());
        catalog
            .set_price(PriceType::StarPerUnit, 300)
            .await
            .unwrap();
        catalog.seed_defaults().await.unwrap();
        assert_eq!(catalog.price_of(PriceType::StarPerUnit).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn star_total_multiplies_count_by_unit_price() {
        let catalog = CatalogService::new(MemoryPrices::default());
        assert_eq!(catalog.star_total(100).await.unwrap(), 24_000);

        catalog
            .set_price(PriceType::StarPerUnit, 250)
            .await
            .unwrap();
        assert_eq!(catalog.star_total(50).await.unwrap(), 12_500);
        assert_eq!(catalog.star_total(5000).await.unwrap(), 1_250_000);
    }
}
