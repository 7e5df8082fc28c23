/// Normalizes a raw phone submission to the canonical "+998" + 9 digits
/// form. Separators (spaces, dashes, parentheses) are stripped first.
/// Accepted shapes: "+998XXXXXXXXX", "998XXXXXXXXX", or a bare 9-digit
/// national number. Anything else is invalid.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match digits.len() {
        12 if digits.starts_with("998") => Some(format!("+{}", digits)),
        9 => Some(format!("+998{}", digits)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_digits_normalize_identically_regardless_of_separators() {
        let canonical = Some("+998901234567".to_string());
        assert_eq!(normalize_phone("+998901234567"), canonical);
        assert_eq!(normalize_phone("998 90 123-45-67"), canonical);
        assert_eq!(normalize_phone("+998 (90) 123-45-67"), canonical);
        assert_eq!(normalize_phone("90 123-45-67"), canonical);
    }

    #[test]
    fn national_numbers_starting_with_998_are_not_misread_as_prefixed() {
        // 99 is a valid operator code; "998765432" is a 9-digit national
        // number, not a truncated international one.
        assert_eq!(
            normalize_phone("99 876-54-32"),
            Some("+998998765432".to_string())
        );
    }

    #[test]
    fn foreign_or_malformed_numbers_are_rejected() {
        assert_eq!(normalize_phone("+79161234567"), None);
        assert_eq!(normalize_phone("+99890123456"), None); // 8 national digits
        assert_eq!(normalize_phone("+9989012345678"), None); // 10 national digits
        assert_eq!(normalize_phone("90123456a"), None);
        assert_eq!(normalize_phone(""), None);
    }
}
