// src/classify/rationale.rs - Human-readable explanation of fired signals
use crate::models::FeatureFlags;

/// Provider probability above which the NER signal is considered fired.
const NER_SIGNAL_THRESHOLD: f64 = 0.70;

const MAX_CITED_SIGNALS: usize = 4;

/// Render a short explanation citing the fired signals in fixed priority
/// order: suffix, keyword, first-name, honorific, government, property,
/// NER probabilities, generation, ampersand, tax-id. At most four are
/// cited; a generic message covers the no-signal case. Signal names, not
/// weights, appear in the text.
pub fn explain(features: &FeatureFlags) -> (String, Vec<String>) {
    let mut fired: Vec<(&'static str, String)> = Vec::new();

    if features.business_suffix {
        fired.push((
            "business_suffix",
            "name carries a legal business suffix".to_string(),
        ));
    }
    if features.business_keyword {
        fired.push((
            "business_keyword",
            "name contains a business keyword".to_string(),
        ));
    }
    if features.first_name_match {
        fired.push((
            "first_name_match",
            "name contains a common first name".to_string(),
        ));
    }
    if features.honorific {
        fired.push(("honorific", "name begins with an honorific".to_string()));
    }
    if features.government_pattern {
        fired.push((
            "government_pattern",
            "name matches a government entity pattern".to_string(),
        ));
    }
    if features.apartment_pattern {
        fired.push((
            "apartment_pattern",
            "name matches a property or housing pattern".to_string(),
        ));
    }
    if features.org_probability >= NER_SIGNAL_THRESHOLD {
        fired.push((
            "org_probability",
            format!(
                "entity recognition leans organization ({:.0}%)",
                features.org_probability * 100.0
            ),
        ));
    } else if features.person_probability >= NER_SIGNAL_THRESHOLD {
        fired.push((
            "person_probability",
            format!(
                "entity recognition leans person ({:.0}%)",
                features.person_probability * 100.0
            ),
        ));
    }
    if features.generation_suffix {
        fired.push((
            "generation_suffix",
            "name ends with a generation suffix".to_string(),
        ));
    }
    if features.ampersand {
        fired.push((
            "ampersand",
            "name joins parties with an ampersand".to_string(),
        ));
    }
    if features.tax_id_pattern {
        fired.push((
            "tax_id_pattern",
            "name embeds a nine-digit tax id".to_string(),
        ));
    }

    if fired.is_empty() {
        return (
            "No strong signals fired; classified by probability comparison".to_string(),
            Vec::new(),
        );
    }

    fired.truncate(MAX_CITED_SIGNALS);
    let rules: Vec<String> = fired.iter().map(|(rule, _)| rule.to_string()).collect();
    let phrases: Vec<&str> = fired.iter().map(|(_, phrase)| phrase.as_str()).collect();
    (
        format!("Classified because {}", phrases.join("; ")),
        rules,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cites_honorific_and_generation() {
        let features = FeatureFlags {
            honorific: true,
            first_name_match: true,
            generation_suffix: true,
            person_probability: 0.95,
            token_count: 5,
            ..Default::default()
        };
        let (reasoning, rules) = explain(&features);
        assert!(reasoning.contains("honorific"));
        assert!(reasoning.contains("generation suffix"));
        assert!(rules.contains(&"honorific".to_string()));
        assert!(rules.contains(&"generation_suffix".to_string()));
        assert!(rules.len() <= 4);
    }

    #[test]
    fn test_cites_business_suffix_and_keyword() {
        let features = FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            org_probability: 0.9,
            token_count: 4,
            ..Default::default()
        };
        let (reasoning, rules) = explain(&features);
        assert!(reasoning.contains("business suffix"));
        assert!(reasoning.contains("business keyword"));
        assert_eq!(rules[0], "business_suffix");
        assert_eq!(rules[1], "business_keyword");
    }

    #[test]
    fn test_priority_order_and_cap() {
        let features = FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            government_pattern: true,
            apartment_pattern: true,
            ampersand: true,
            tax_id_pattern: true,
            ..Default::default()
        };
        let (_, rules) = explain(&features);
        assert_eq!(
            rules,
            vec![
                "business_suffix",
                "business_keyword",
                "government_pattern",
                "apartment_pattern"
            ]
        );
    }

    #[test]
    fn test_generic_message_when_nothing_fired() {
        let (reasoning, rules) = explain(&FeatureFlags::default());
        assert!(reasoning.contains("No strong signals"));
        assert!(rules.is_empty());
    }

    #[test]
    fn test_no_raw_weights_in_text() {
        let features = FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            ..Default::default()
        };
        let (reasoning, _) = explain(&features);
        assert!(!reasoning.contains("0.45"));
        assert!(!reasoning.contains("0.30"));
    }
}
