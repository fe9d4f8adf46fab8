//! Canonical names for commercial lines and products.
//!
//! Commercial lines are grouped for goal-setting: third-party brands ("GENVET", "MARCA BLANCA",
//! and their regional variants) all roll up into [`THIRD_PARTY_LINE`]. ATREVIA products are sold
//! in several sizes that should be reported as one product, so their trailing size/presentation
//! token is removed.

/// Canonical label for third-party commercial lines.
pub const THIRD_PARTY_LINE: &str = "TERCEROS";

const THIRD_PARTY_MARKERS: [&str; 2] = ["GENVET", "MARCA BLANCA"];

const SIZE_SUFFIX_BRAND: &str = "ATREVIA";

const SIZE_SUFFIXES: [&str; 14] = [
    "MEDIUM",
    "LARGE",
    "SMALL",
    "MINI",
    "EXTRA LARGE",
    "XL",
    "L",
    "M",
    "S",
    "SPOT ON MEDIUM",
    "SPOT ON LARGE",
    "SPOT ON SMALL",
    "SPOT ON MINI",
    "SPOT ON",
];

/// Uppercases and trims a commercial line name, folding third-party brands into `TERCEROS`.
/// `None` and empty names pass through untouched.
pub fn normalize_commercial_line(name: Option<&str>) -> Option<String> {
    let name = name?;
    if name.is_empty() {
        return Some(String::new());
    }

    let upper = name.trim().to_uppercase();
    if THIRD_PARTY_MARKERS
        .iter()
        .any(|marker| upper.contains(marker))
    {
        return Some(THIRD_PARTY_LINE.to_string());
    }

    Some(upper)
}

/// Size/presentation tokens, longest first so that "LARGE" wins over "L".
fn suffixes_longest_first() -> Vec<&'static str> {
    let mut suffixes = SIZE_SUFFIXES.to_vec();
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()));
    suffixes
}

/// Removes one trailing size token from ATREVIA product names.
///
/// - `ATREVIA ONE MEDIUM` → `ATREVIA ONE`
/// - `ATREVIA TRIO CATS SPOT ON MEDIUM` → `ATREVIA TRIO CATS`
///
/// Names without the brand are returned unchanged.
pub fn strip_size_suffix(product_name: &str) -> String {
    if !product_name.to_uppercase().contains(SIZE_SUFFIX_BRAND) {
        return product_name.to_string();
    }

    let trimmed = product_name.trim();
    let bytes = trimmed.as_bytes();

    for suffix in suffixes_longest_first() {
        let pattern = format!(" {}", suffix);
        if bytes.len() < pattern.len() {
            continue;
        }
        let cut = bytes.len() - pattern.len();
        // Suffixes are ASCII, so a match always starts on a char boundary.
        if bytes[cut..].eq_ignore_ascii_case(pattern.as_bytes()) {
            return trimmed[..cut].trim_end().to_string();
        }
    }

    trimmed.to_string()
}

/// Goal-store identifier for a commercial line display name (`PET NUTRISCIENCE` → `pet_nutriscience`).
pub fn line_key(display_name: &str) -> String {
    display_name.trim().to_lowercase().replace(' ', "_")
}

/// Display name rebuilt from a goal-store identifier (`pet_nutriscience` → `PET NUTRISCIENCE`).
pub fn display_name_from_key(key: &str) -> String {
    key.trim().replace('_', " ").to_uppercase()
}

/// Canonical goal key: goals stored under third-party identifiers land on `terceros`.
pub fn canonical_goal_key(raw_key: &str) -> String {
    let display = display_name_from_key(raw_key);
    match normalize_commercial_line(Some(&display)) {
        Some(normalized) => line_key(&normalized),
        None => line_key(&display),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_groups_third_party_lines() {
        assert_eq!(
            normalize_commercial_line(Some("GENVET PERU")).as_deref(),
            Some("TERCEROS")
        );
        assert_eq!(
            normalize_commercial_line(Some("  marca blanca ")).as_deref(),
            Some("TERCEROS")
        );
        assert_eq!(
            normalize_commercial_line(Some("Genvet")).as_deref(),
            Some("TERCEROS")
        );
        assert_eq!(
            normalize_commercial_line(Some(" petmedica ")).as_deref(),
            Some("PETMEDICA")
        );
    }

    #[test]
    fn test_normalize_passes_through_missing_names() {
        assert_eq!(normalize_commercial_line(None), None);
        assert_eq!(normalize_commercial_line(Some("")).as_deref(), Some(""));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in [
            "GENVET PERU",
            "Pet Nutriscience",
            "  agrovet",
            "MARCA BLANCA",
            "VENTA INTERNACIONAL",
            "",
        ] {
            let once = normalize_commercial_line(Some(name));
            let twice = normalize_commercial_line(once.as_deref());
            assert_eq!(once, twice, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_strip_size_suffix_examples() {
        assert_eq!(
            strip_size_suffix("ATREVIA TRIO CATS SPOT ON MEDIUM"),
            "ATREVIA TRIO CATS"
        );
        assert_eq!(
            strip_size_suffix("ATREVIA TRIO CATS SPOT ON SMALL"),
            "ATREVIA TRIO CATS"
        );
        assert_eq!(strip_size_suffix("ATREVIA CATS SPOT ON MINI"), "ATREVIA CATS");
        assert_eq!(strip_size_suffix("ATREVIA ONE MEDIUM"), "ATREVIA ONE");
        assert_eq!(strip_size_suffix("ATREVIA XR LARGE"), "ATREVIA XR");
        assert_eq!(strip_size_suffix("ATREVIA 360° MEDIUM"), "ATREVIA 360°");
        assert_eq!(strip_size_suffix("Atrevia One xl"), "Atrevia One");
    }

    #[test]
    fn test_strip_size_suffix_prefers_longest_token() {
        assert_eq!(strip_size_suffix("ATREVIA MAX EXTRA LARGE"), "ATREVIA MAX");
        assert_eq!(strip_size_suffix("ATREVIA MAX L"), "ATREVIA MAX");
        // Only one suffix is removed per call.
        assert_eq!(strip_size_suffix("ATREVIA MAX MINI S"), "ATREVIA MAX MINI");
    }

    #[test]
    fn test_strip_size_suffix_requires_brand() {
        assert_eq!(strip_size_suffix("BRAVECTO LARGE"), "BRAVECTO LARGE");
        assert_eq!(strip_size_suffix("  OTHER M "), "  OTHER M ");
    }

    #[test]
    fn test_strip_size_suffix_never_lengthens() {
        for name in [
            "ATREVIA",
            "ATREVIA ",
            "ATREVIA SPOT ON",
            "ATREVIA CATS SPOT ON MINI",
            "xATREVIAx M",
            "ATREVIA ñ S",
        ] {
            assert!(strip_size_suffix(name).len() <= name.len());
        }
    }

    #[test]
    fn test_line_key_round_trip_names() {
        assert_eq!(line_key("PET NUTRISCIENCE"), "pet_nutriscience");
        assert_eq!(display_name_from_key("pet_nutriscience"), "PET NUTRISCIENCE");
        assert_eq!(display_name_from_key("ECOMMERCE"), "ECOMMERCE");
    }

    #[test]
    fn test_canonical_goal_key_folds_third_party() {
        assert_eq!(canonical_goal_key("genvet"), "terceros");
        assert_eq!(canonical_goal_key("MARCA_BLANCA"), "terceros");
        assert_eq!(canonical_goal_key("PET_NUTRISCIENCE"), "pet_nutriscience");
        assert_eq!(canonical_goal_key("petmedica"), "petmedica");
    }
}
