//! Canonical forms for field names and descriptions.

use icu_normalizer::DecomposingNormalizerBorrowed;

/// Decomposes to NFD and keeps only ASCII code points.
///
/// Combining marks vanish with the rest of the non-ASCII output, so "é"
/// becomes "e" and characters without an ASCII base are dropped.
fn ascii_fold(raw: &str) -> impl Iterator<Item = char> + '_ {
    DecomposingNormalizerBorrowed::new_nfd()
        .normalize_iter(raw.chars())
        .filter(char::is_ascii)
}

/// Normalizes a field name: diacritics stripped, lowercase, `[a-z0-9]` only.
///
/// `"Bank-Name 1"` becomes `"bankname1"`.
pub fn normalize_name(raw: &str) -> String {
    ascii_fold(raw)
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalizes a description: diacritics stripped, lowercase, whitespace
/// runs collapsed to one space, ends trimmed.
pub fn normalize_description(raw: &str) -> String {
    let folded: String = ascii_fold(raw).map(|c| c.to_ascii_lowercase()).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Like [`normalize_name`] for optional input.
pub fn normalize_name_opt(raw: Option<&str>) -> String {
    raw.map(normalize_name).unwrap_or_default()
}

/// Like [`normalize_description`] for optional input.
pub fn normalize_description_opt(raw: Option<&str>) -> String {
    raw.map(normalize_description).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_strips_punctuation_and_case() {
        assert_eq!(normalize_name("Bank-Name 1"), "bankname1");
        assert_eq!(normalize_name("BANK_KEY"), "bankkey");
        assert_eq!(normalize_name("  S_BNKA#BANKL "), "sbnkabankl");
    }

    #[test]
    fn name_strips_diacritics() {
        assert_eq!(normalize_name("Café"), "cafe");
        assert_eq!(normalize_name("Überweisung"), "uberweisung");
        assert_eq!(normalize_name("Número"), "numero");
    }

    #[test]
    fn name_drops_characters_without_ascii_base() {
        assert_eq!(normalize_name("Straße"), "strae");
        assert_eq!(normalize_name("東京"), "");
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_description(""), "");
        assert_eq!(normalize_name_opt(None), "");
        assert_eq!(normalize_description_opt(None), "");
    }

    #[test]
    fn description_collapses_whitespace() {
        assert_eq!(
            normalize_description("  Name of\t the   Bánk \n"),
            "name of the bank"
        );
        assert_eq!(normalize_description("Bank-Key (ID)"), "bank-key (id)");
    }
}
