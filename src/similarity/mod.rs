// src/similarity/mod.rs - String similarity metrics for near-duplicate detection
use std::collections::HashMap;

use crate::models::SimilarityScores;

/// Fixed convex blend weights for the combined score.
const LEVENSHTEIN_WEIGHT: f64 = 0.25;
const JARO_WINKLER_WEIGHT: f64 = 0.35;
const DICE_WEIGHT: f64 = 0.25;
const TOKEN_SORT_WEIGHT: f64 = 0.15;

/// Levenshtein similarity in [0, 100]: (maxLen - editDistance) / maxLen.
/// Two empty strings are identical (100).
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let distance = strsim::levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64 * 100.0
}

/// Jaro-Winkler similarity in [0, 100]: Jaro plus a 0.1-per-char bonus for
/// up to four characters of common prefix.
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b) * 100.0
}

/// Sorensen-Dice bigram similarity in [0, 100]. Strings shorter than two
/// characters have no bigrams and score 0 unless equal.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    let bigrams_a = char_bigrams(a);
    let bigrams_b = char_bigrams(b);
    if bigrams_a.is_empty() || bigrams_b.is_empty() {
        return 0.0;
    }
    let total: usize = bigrams_a.values().sum::<usize>() + bigrams_b.values().sum::<usize>();
    let mut overlap = 0usize;
    for (bigram, count_a) in &bigrams_a {
        if let Some(count_b) = bigrams_b.get(bigram) {
            overlap += (*count_a).min(*count_b);
        }
    }
    2.0 * overlap as f64 / total as f64 * 100.0
}

/// Order-insensitive similarity in [0, 100]: Levenshtein similarity of the
/// alphabetically-sorted, lower-cased, punctuation-stripped token sequences.
pub fn token_sort_similarity(a: &str, b: &str) -> f64 {
    levenshtein_similarity(&sorted_token_key(a), &sorted_token_key(b))
}

/// All four metrics plus their fixed 0.25/0.35/0.25/0.15 blend.
pub fn combined_similarity(a: &str, b: &str) -> SimilarityScores {
    let levenshtein = levenshtein_similarity(a, b);
    let jaro_winkler = jaro_winkler_similarity(a, b);
    let dice = dice_similarity(a, b);
    let token_sort = token_sort_similarity(a, b);
    let combined = LEVENSHTEIN_WEIGHT * levenshtein
        + JARO_WINKLER_WEIGHT * jaro_winkler
        + DICE_WEIGHT * dice
        + TOKEN_SORT_WEIGHT * token_sort;
    SimilarityScores {
        levenshtein,
        jaro_winkler,
        dice,
        token_sort,
        combined,
    }
}

fn char_bigrams(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut bigrams = HashMap::new();
    for window in chars.windows(2) {
        *bigrams.entry((window[0], window[1])).or_insert(0) += 1;
    }
    bigrams
}

fn sorted_token_key(s: &str) -> String {
    let mut tokens: Vec<String> = s
        .to_lowercase()
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
        .map(|t| t.to_string())
        .collect();
    tokens.sort();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_100() {
        let scores = combined_similarity("Acme Inc", "Acme Inc");
        assert_eq!(scores.levenshtein, 100.0);
        assert_eq!(scores.jaro_winkler, 100.0);
        assert_eq!(scores.dice, 100.0);
        assert_eq!(scores.token_sort, 100.0);
        assert!((scores.combined - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("Smith Consulting", "Smith Consultng"),
            ("", "Acme"),
            ("a", "b"),
            ("O'Brien & Sons", "OBrien and Sons"),
        ];
        for (a, b) in pairs {
            assert_eq!(levenshtein_similarity(a, b), levenshtein_similarity(b, a));
            assert_eq!(jaro_winkler_similarity(a, b), jaro_winkler_similarity(b, a));
            assert_eq!(dice_similarity(a, b), dice_similarity(b, a));
            assert_eq!(token_sort_similarity(a, b), token_sort_similarity(b, a));
        }
    }

    #[test]
    fn test_bounds() {
        let pairs = [
            ("completely different", "nothing alike xyz"),
            ("", ""),
            ("a", ""),
            ("same", "same"),
        ];
        for (a, b) in pairs {
            let scores = combined_similarity(a, b);
            for value in [
                scores.levenshtein,
                scores.jaro_winkler,
                scores.dice,
                scores.token_sort,
                scores.combined,
            ] {
                assert!((0.0..=100.0).contains(&value), "{} out of bounds", value);
            }
        }
    }

    #[test]
    fn test_near_duplicate_exceeds_fuzzy_threshold() {
        let scores = combined_similarity("Smith Consulting", "Smith Consultng");
        assert!(
            scores.combined >= 90.0,
            "combined was {}",
            scores.combined
        );
    }

    #[test]
    fn test_token_sort_is_order_insensitive() {
        assert_eq!(token_sort_similarity("John Smith", "Smith, John"), 100.0);
    }

    #[test]
    fn test_dice_short_strings() {
        assert_eq!(dice_similarity("a", "ab"), 0.0);
        assert_eq!(dice_similarity("a", "a"), 100.0);
        assert_eq!(dice_similarity("", ""), 100.0);
    }

    #[test]
    fn test_empty_vs_nonempty() {
        assert_eq!(levenshtein_similarity("", "abc"), 0.0);
        assert_eq!(dice_similarity("", "abc"), 0.0);
    }
}
