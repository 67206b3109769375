// src/classify/normalizer.rs - Canonicalization of raw payee names
use unicode_normalization::UnicodeNormalization;

use crate::models::NormalizedName;

/// Normalize a raw payee name into its canonical comparison form:
/// NFC-composed upper-case text with diacritics stripped, punctuation
/// collapsed to whitespace (apostrophes kept), `&` standardized to `AND`,
/// and runs of whitespace collapsed to single spaces.
///
/// Empty or non-textual input yields an empty result. The transform is
/// idempotent: normalizing a normalized name is a no-op.
pub fn normalize(raw: &str) -> NormalizedName {
    if raw.trim().is_empty() {
        return NormalizedName {
            text: String::new(),
            tokens: Vec::new(),
        };
    }

    // Canonical composition first so case mapping sees precomposed chars,
    // then decompose and drop combining marks to strip diacritics.
    let composed: String = raw.nfc().collect::<String>().to_uppercase();
    let stripped: String = composed
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    // Keep alphanumerics, whitespace, ampersands and apostrophes; everything
    // else becomes a space so token boundaries survive.
    let cleaned: String = stripped
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '&' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let standardized = cleaned.replace('&', " AND ");

    let tokens: Vec<String> = standardized
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    let text = tokens.join(" ");

    NormalizedName { text, tokens }
}

/// Lower-cased, punctuation-stripped, whitespace-collapsed key used for
/// duplicate detection. Distinct from `normalize` so the comparison key can
/// evolve without changing classification inputs.
pub fn comparison_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_obrien_and_sons() {
        let normalized = normalize("O'Brien & Sons, LLC.");
        assert_eq!(normalized.text, "O'BRIEN AND SONS LLC");
        assert_eq!(normalized.tokens, vec!["O'BRIEN", "AND", "SONS", "LLC"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "O'Brien & Sons, LLC.",
            "  Café  Ríos   ",
            "",
            "   ",
            "Dr. John A. Smith III",
            "ACME-CORP (WEST)",
        ] {
            let once = normalize(raw);
            let twice = normalize(&once.text);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("Café Ríos Peña").text, "CAFE RIOS PENA");
    }

    #[test]
    fn test_normalize_empty_and_whitespace() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t  ").is_empty());
        assert!(normalize("").tokens.is_empty());
    }

    #[test]
    fn test_normalize_collapses_punctuation_runs() {
        assert_eq!(normalize("A..B--C//D").text, "A B C D");
    }

    #[test]
    fn test_comparison_key() {
        assert_eq!(comparison_key("O'Brien & Sons, LLC."), "o brien sons llc");
        assert_eq!(
            comparison_key("  Acme   Inc.  "),
            comparison_key("ACME, INC")
        );
    }
}
