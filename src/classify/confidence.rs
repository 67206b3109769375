// src/classify/confidence.rs - Additive confidence calibration
use crate::models::FeatureFlags;

pub const CONFIDENCE_FLOOR: u8 = 50;
pub const CONFIDENCE_CEILING: u8 = 99;

/// Strong-indicator increments. All non-negative so a fired signal can
/// never lower confidence.
const SUFFIX_BONUS: u32 = 15;
const HONORIFIC_BONUS: u32 = 15;
const KEYWORD_BONUS: u32 = 10;
const FIRST_NAME_BONUS: u32 = 10;
const GOVERNMENT_BONUS: u32 = 10;
const APARTMENT_BONUS: u32 = 8;
const TAX_ID_BONUS: u32 = 5;
const GENERATION_BONUS: u32 = 5;
const AMPERSAND_BONUS: u32 = 3;

/// Calibrate a confidence in [CONFIDENCE_FLOOR, CONFIDENCE_CEILING] from
/// the raw score and the fired signals. Monotone in every signal: each
/// contribution is additive and non-negative.
pub fn calibrate(raw_score: f64, features: &FeatureFlags) -> u8 {
    let mut confidence = CONFIDENCE_FLOOR as u32;

    if features.business_suffix {
        confidence += SUFFIX_BONUS;
    }
    if features.honorific {
        confidence += HONORIFIC_BONUS;
    }
    if features.business_keyword {
        confidence += KEYWORD_BONUS;
    }
    if features.first_name_match {
        confidence += FIRST_NAME_BONUS;
    }
    if features.government_pattern {
        confidence += GOVERNMENT_BONUS;
    }
    if features.apartment_pattern {
        confidence += APARTMENT_BONUS;
    }
    if features.tax_id_pattern {
        confidence += TAX_ID_BONUS;
    }
    if features.generation_suffix {
        confidence += GENERATION_BONUS;
    }
    if features.ampersand {
        confidence += AMPERSAND_BONUS;
    }

    // Score magnitude bonus: a decisive weighted sum is worth up to 15.
    confidence += (raw_score.abs() * 15.0).round() as u32;

    // Corroboration bonus when multiple independent signal categories agree.
    let categories = [
        features.business_suffix,
        features.business_keyword,
        features.honorific,
        features.first_name_match,
        features.government_pattern,
        features.apartment_pattern,
    ]
    .iter()
    .filter(|fired| **fired)
    .count();
    if categories >= 2 {
        confidence += 5;
    }
    if categories >= 3 {
        confidence += 3;
    }

    confidence.clamp(CONFIDENCE_FLOOR as u32, CONFIDENCE_CEILING as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_with_no_signals() {
        let confidence = calibrate(0.0, &FeatureFlags::default());
        assert_eq!(confidence, CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_ceiling_clamp() {
        let features = FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            government_pattern: true,
            apartment_pattern: true,
            tax_id_pattern: true,
            ampersand: true,
            ..Default::default()
        };
        assert_eq!(calibrate(1.0, &features), CONFIDENCE_CEILING);
    }

    #[test]
    fn test_strong_business_meets_medium_threshold() {
        // Suffix + keyword with a decisive score must clear 85 so the
        // rule-based tier can terminate, e.g. "Apex Plumbing Services LLC".
        let features = FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            token_count: 4,
            org_probability: 0.9,
            ..Default::default()
        };
        assert!(calibrate(0.93, &features) >= 85);
    }

    #[test]
    fn test_monotone_in_each_signal() {
        let base = FeatureFlags {
            token_count: 3,
            ..Default::default()
        };
        let base_confidence = calibrate(0.2, &base);
        for set in 0..9 {
            let mut features = base.clone();
            match set {
                0 => features.business_suffix = true,
                1 => features.business_keyword = true,
                2 => features.honorific = true,
                3 => features.first_name_match = true,
                4 => features.government_pattern = true,
                5 => features.apartment_pattern = true,
                6 => features.tax_id_pattern = true,
                7 => features.generation_suffix = true,
                _ => features.ampersand = true,
            }
            assert!(
                calibrate(0.2, &features) >= base_confidence,
                "signal {} lowered confidence",
                set
            );
        }
    }

    #[test]
    fn test_bounds() {
        for raw in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            let confidence = calibrate(raw, &FeatureFlags::default());
            assert!((CONFIDENCE_FLOOR..=CONFIDENCE_CEILING).contains(&confidence));
        }
    }
}
