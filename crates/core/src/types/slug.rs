//! URL slugs for categories and products.

/// Lowercase `name` and replace each run of whitespace with a single `-`.
///
/// ```
/// use yemeni_market_core::slugify;
///
/// assert_eq!(slugify("Royal  Sidr Honey"), "royal-sidr-honey");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Product slug made unique with a millisecond timestamp suffix.
#[must_use]
pub fn unique_slug(name: &str, unix_millis: i64) -> String {
    format!("{}-{unix_millis}", slugify(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("  Premium\tHaraz   Coffee "), "premium-haraz-coffee");
    }

    #[test]
    fn test_slugify_keeps_punctuation() {
        assert_eq!(slugify("Sidr Honey (Do'an)"), "sidr-honey-(do'an)");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_unique_slug() {
        assert_eq!(unique_slug("Gift Box", 1_700_000_000_000), "gift-box-1700000000000");
    }
}
