use yulduz_db::models::PriceType;

use crate::bot::keyboards::labels;

pub const MIN_STARS: i64 = 50;
pub const MAX_STARS: i64 = 5000;

/// Star quantity, accepted only within the inclusive 50–5000 bound.
pub fn parse_star_amount(text: &str) -> Option<i64> {
    let count: i64 = text.trim().parse().ok()?;
    (MIN_STARS..=MAX_STARS).contains(&count).then_some(count)
}

/// Strictly positive integer (admin star adjustments, price updates).
pub fn parse_positive_amount(text: &str) -> Option<i64> {
    let value: i64 = text.trim().parse().ok()?;
    (value > 0).then_some(value)
}

/// Resolves recipient input to an "@handle" form. The "myself" sentinel
/// resolves to the submitter's own username.
pub fn resolve_recipient(text: &str, own_username: Option<&str>) -> String {
    let trimmed = text.trim();
    if trimmed == labels::MYSELF {
        return format!("@{}", own_username.unwrap_or("nomalum"));
    }
    if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{}", trimmed)
    }
}

/// Premium package keyboard label → catalog SKU.
pub fn package_from_label(text: &str) -> Option<PriceType> {
    match text {
        labels::PACKAGE_3 => Some(PriceType::Premium3Months),
        labels::PACKAGE_6 => Some(PriceType::Premium6Months),
        labels::PACKAGE_12 => Some(PriceType::Premium12Months),
        _ => None,
    }
}

/// Admin price-edit keyboard label → catalog SKU.
pub fn price_type_from_label(text: &str) -> Option<PriceType> {
    match text {
        labels::PRICE_PREMIUM_3 => Some(PriceType::Premium3Months),
        labels::PRICE_PREMIUM_6 => Some(PriceType::Premium6Months),
        labels::PRICE_PREMIUM_12 => Some(PriceType::Premium12Months),
        labels::PRICE_STAR => Some(PriceType::StarPerUnit),
        _ => None,
    }
}

/// Referral payloads arrive as "ref123456" or a bare numeric id.
pub fn parse_referral_payload(payload: &str) -> Option<i64> {
    let trimmed = payload.trim();
    let digits = trimmed.strip_prefix("ref").unwrap_or(trimmed);
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_amount_bounds_are_inclusive() {
        assert_eq!(parse_star_amount("50"), Some(50));
        assert_eq!(parse_star_amount("5000"), Some(5000));
        assert_eq!(parse_star_amount("49"), None);
        assert_eq!(parse_star_amount("5001"), None);
        assert_eq!(parse_star_amount("3000"), Some(3000));
        assert_eq!(parse_star_amount("abc"), None);
        assert_eq!(parse_star_amount("-100"), None);
    }

    #[test]
    fn positive_amount_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_amount("10"), Some(10));
        assert_eq!(parse_positive_amount("0"), None);
        assert_eq!(parse_positive_amount("-3"), None);
        assert_eq!(parse_positive_amount("ten"), None);
    }

    #[test]
    fn recipient_resolution() {
        assert_eq!(resolve_recipient(labels::MYSELF, Some("ali")), "@ali");
        assert_eq!(resolve_recipient(labels::MYSELF, None), "@nomalum");
        assert_eq!(resolve_recipient("@vali", Some("ali")), "@vali");
        assert_eq!(resolve_recipient("vali", Some("ali")), "@vali");
    }

    #[test]
    fn referral_payload_shapes() {
        assert_eq!(parse_referral_payload("ref123456"), Some(123456));
        assert_eq!(parse_referral_payload("123456"), Some(123456));
        assert_eq!(parse_referral_payload("refabc"), None);
        assert_eq!(parse_referral_payload(""), None);
    }

    #[test]
    fn package_labels_map_to_skus() {
        assert_eq!(
            package_from_label(labels::PACKAGE_3),
            Some(PriceType::Premium3Months)
        );
        assert_eq!(
            package_from_label(labels::PACKAGE_12),
            Some(PriceType::Premium12Months)
        );
        assert_eq!(package_from_label("📦 24 oy"), None);
    }
}
