// src/classify/heuristic.rs - Cheap structural scorer for the heuristic tier
//
// Works on the raw name, not the normalized form: casing and punctuation are
// exactly the signals normalization throws away.
use crate::models::{Classification, ClassificationResult, ProcessingTier};

const HEURISTIC_BASE_CONFIDENCE: u32 = 55;
const HEURISTIC_CUE_BONUS: u32 = 8;
const HEURISTIC_MAX_CONFIDENCE: u32 = 90;

/// Score a raw name from surface structure alone: word count, casing,
/// punctuation, possessives. Used when the rule-based and fuzzy tiers were
/// inconclusive; the escalation policy decides whether the confidence is
/// high enough to terminate.
pub fn structural_classify(raw: &str) -> ClassificationResult {
    let trimmed = raw.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let word_count = words.len();

    let mut business_cues: Vec<&'static str> = Vec::new();
    let mut person_cues: Vec<&'static str> = Vec::new();

    // All-caps multi-word names are overwhelmingly registered entities.
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if !letters.is_empty() && letters.iter().all(|c| c.is_uppercase()) && word_count >= 2 {
        business_cues.push("all_caps");
    }

    // Possessive trade names ("Joe's Diner") read as businesses.
    if words
        .iter()
        .any(|w| w.ends_with("'s") || w.ends_with("'S"))
    {
        business_cues.push("possessive");
    }

    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        business_cues.push("digits");
    }

    // "Surname, Given" comma inversion is a personal-name convention.
    if word_count <= 4 && trimmed.contains(", ") {
        person_cues.push("comma_inversion");
    }

    // Two or three title-case words with no other cues look like a person.
    let title_case = words
        .iter()
        .all(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false))
        && words.iter().any(|w| w.chars().skip(1).any(|c| c.is_lowercase()));
    if (2..=3).contains(&word_count) && title_case && business_cues.is_empty() {
        person_cues.push("title_case_pair");
    }

    if word_count >= 4 {
        business_cues.push("long_name");
    } else if word_count == 1 {
        person_cues.push("single_word");
    }

    let (classification, cues) = if business_cues.len() >= person_cues.len() && !business_cues.is_empty() {
        (Classification::Business, business_cues)
    } else if !person_cues.is_empty() {
        (Classification::Individual, person_cues)
    } else {
        (Classification::Individual, Vec::new())
    };

    let confidence = (HEURISTIC_BASE_CONFIDENCE
        + HEURISTIC_CUE_BONUS * cues.len() as u32)
        .min(HEURISTIC_MAX_CONFIDENCE) as u8;

    let reasoning = if cues.is_empty() {
        "No structural cues; defaulted to Individual".to_string()
    } else {
        format!("Structural cues: {}", cues.join(", "))
    };

    ClassificationResult {
        classification,
        confidence,
        reasoning,
        tier: ProcessingTier::Heuristic,
        matching_rules: cues.iter().map(|c| format!("structural:{}", c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_possessive_trade_name() {
        let result = structural_classify("Joe's Diner");
        assert_eq!(result.classification, Classification::Business);
        assert!(result.reasoning.contains("possessive"));
    }

    #[test]
    fn test_comma_inverted_person() {
        let result = structural_classify("Smith, John");
        assert_eq!(result.classification, Classification::Individual);
        assert!(result
            .matching_rules
            .contains(&"structural:comma_inversion".to_string()));
    }

    #[test]
    fn test_title_case_pair_is_person() {
        let result = structural_classify("Jane Doe");
        assert_eq!(result.classification, Classification::Individual);
    }

    #[test]
    fn test_all_caps_multiword_is_business() {
        let result = structural_classify("NORTHWEST GRAVEL HAULING");
        assert_eq!(result.classification, Classification::Business);
    }

    #[test]
    fn test_confidence_bounds() {
        for name in ["x", "Jane Doe", "ACME 24/7 TOWING'S BEST #1", ""] {
            let result = structural_classify(name);
            assert!(result.confidence <= 90);
            assert!(result.confidence >= 55);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = structural_classify("Riverbend Supply Co");
        let b = structural_classify("Riverbend Supply Co");
        assert_eq!(a.classification, b.classification);
        assert_eq!(a.confidence, b.confidence);
    }
}
