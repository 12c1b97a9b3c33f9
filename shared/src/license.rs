//! Buyer license eligibility policy
//!
//! A buyer's license level is derived from the free-text license number on
//! their account. Absence or garbage degrades to level 0 ("no license")
//! instead of failing, so an unparseable field can never grant access to a
//! gated weapon.

/// Derive a numeric license level from the free-text license number field.
///
/// Empty, missing, non-numeric or negative input all yield 0.
pub fn derive_level(license_number: Option<&str>) -> i32 {
    license_number
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|level| *level >= 0)
        .unwrap_or(0)
}

/// Whether a buyer at `buyer_level` may purchase an item requiring
/// `required_level`.
#[inline]
pub fn is_eligible(buyer_level: i32, required_level: i32) -> bool {
    buyer_level >= required_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_level_numeric() {
        assert_eq!(derive_level(Some("3")), 3);
        assert_eq!(derive_level(Some("0")), 0);
        assert_eq!(derive_level(Some(" 5 ")), 5);
    }

    #[test]
    fn test_derive_level_missing_or_empty() {
        assert_eq!(derive_level(None), 0);
        assert_eq!(derive_level(Some("")), 0);
        assert_eq!(derive_level(Some("   ")), 0);
    }

    #[test]
    fn test_derive_level_garbage_fails_closed() {
        assert_eq!(derive_level(Some("LIC-2024-X")), 0);
        assert_eq!(derive_level(Some("3a")), 0);
        assert_eq!(derive_level(Some("-2")), 0);
        assert_eq!(derive_level(Some("2.5")), 0);
    }

    #[test]
    fn test_is_eligible() {
        assert!(is_eligible(3, 3));
        assert!(is_eligible(3, 2));
        assert!(is_eligible(0, 0));
        assert!(!is_eligible(2, 3));
        assert!(!is_eligible(0, 1));
    }
}
