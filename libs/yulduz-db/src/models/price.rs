use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The closed set of priced SKUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    Premium3Months,
    Premium6Months,
    Premium12Months,
    StarPerUnit,
}

impl PriceType {
    pub const ALL: [PriceType; 4] = [
        PriceType::Premium3Months,
        PriceType::Premium6Months,
        PriceType::Premium12Months,
        PriceType::StarPerUnit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Premium3Months => "premium_3_months",
            PriceType::Premium6Months => "premium_6_months",
            PriceType::Premium12Months => "premium_12_months",
            PriceType::StarPerUnit => "star_per_unit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "premium_3_months" => Some(PriceType::Premium3Months),
            "premium_6_months" => Some(PriceType::Premium6Months),
            "premium_12_months" => Some(PriceType::Premium12Months),
            "star_per_unit" => Some(PriceType::StarPerUnit),
            _ => None,
        }
    }

    /// Seed value used when the catalog row is absent at startup.
    pub fn default_value(&self) -> i64 {
        match self {
            PriceType::Premium3Months => 175_000,
            PriceType::Premium6Months => 240_000,
            PriceType::Premium12Months => 405_000,
            PriceType::StarPerUnit => 240,
        }
    }

    pub fn months(&self) -> Option<i64> {
        match self {
            PriceType::Premium3Months => Some(3),
            PriceType::Premium6Months => Some(6),
            PriceType::Premium12Months => Some(12),
            PriceType::StarPerUnit => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceEntry {
    pub price_type: String,
    pub value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_type_round_trips_through_tag() {
        for pt in PriceType::ALL {
            assert_eq!(PriceType::from_str(pt.as_str()), Some(pt));
        }
        assert_eq!(PriceType::from_str("premium_24_months"), None);
    }

    #[test]
    fn premium_types_carry_duration() {
        assert_eq!(PriceType::Premium3Months.months(), Some(3));
        assert_eq!(PriceType::Premium12Months.months(), Some(12));
        assert_eq!(PriceType::StarPerUnit.months(), None);
    }
}
