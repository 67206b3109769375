// src/classify/features.rs - Fixed-lookup feature extraction from normalized names
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::classify::signals::EntitySignalProvider;
use crate::models::{FeatureFlags, NormalizedName};

/// Legal entity suffixes that mark a business payee. Tokens are compared
/// against the upper-cased normalized form.
pub const LEGAL_SUFFIXES: [&str; 22] = [
    "LLC", "INC", "INCORPORATED", "CORP", "CORPORATION", "LTD", "LIMITED", "CO", "COMPANY", "LP",
    "LLP", "PLLC", "PC", "PLC", "GMBH", "AG", "SA", "BV", "NV", "PTY", "SARL", "SRL",
];

pub const BUSINESS_KEYWORDS: [&str; 36] = [
    "SERVICES", "SERVICE", "CONSULTING", "CONSULTANTS", "SOLUTIONS", "ENTERPRISES", "ENTERPRISE",
    "GROUP", "HOLDINGS", "PARTNERS", "ASSOCIATES", "AGENCY", "STUDIO", "STUDIOS", "PLUMBING",
    "ELECTRIC", "ELECTRICAL", "CONSTRUCTION", "ROOFING", "LANDSCAPING", "CLEANING", "AUTOMOTIVE",
    "AUTO", "RESTAURANT", "CATERING", "BAKERY", "SALON", "SUPPLY", "SUPPLIES", "DISTRIBUTION",
    "LOGISTICS", "TRANSPORT", "BANK", "INSURANCE", "REALTY", "VENTURES",
];

pub const HONORIFICS: [&str; 10] = [
    "MR", "MRS", "MS", "MISS", "DR", "PROF", "REV", "HON", "SIR", "FR",
];

pub const GENERATION_SUFFIXES: [&str; 7] = ["JR", "SR", "II", "III", "IV", "V", "VI"];

/// Small gazetteer of common given names. Deliberately high-precision rather
/// than exhaustive; the entity-signal provider covers the long tail.
pub const FIRST_NAMES: [&str; 60] = [
    "JAMES", "JOHN", "ROBERT", "MICHAEL", "WILLIAM", "DAVID", "RICHARD", "JOSEPH", "THOMAS",
    "CHARLES", "CHRISTOPHER", "DANIEL", "MATTHEW", "ANTHONY", "MARK", "DONALD", "STEVEN", "PAUL",
    "ANDREW", "JOSHUA", "KENNETH", "KEVIN", "BRIAN", "GEORGE", "EDWARD", "RONALD", "TIMOTHY",
    "JASON", "JEFFREY", "RYAN", "MARY", "PATRICIA", "JENNIFER", "LINDA", "ELIZABETH", "BARBARA",
    "SUSAN", "JESSICA", "SARAH", "KAREN", "NANCY", "LISA", "MARGARET", "BETTY", "SANDRA",
    "ASHLEY", "DOROTHY", "KIMBERLY", "EMILY", "DONNA", "MICHELLE", "CAROL", "AMANDA", "MELISSA",
    "DEBORAH", "STEPHANIE", "REBECCA", "LAURA", "MARIA", "ANNA",
];

/// Multi-token phrases indicating a government payee; matched as substrings
/// of the normalized text.
pub const GOVERNMENT_PHRASES: [&str; 12] = [
    "CITY OF", "COUNTY OF", "STATE OF", "DEPARTMENT OF", "UNITED STATES", "US TREASURY",
    "INTERNAL REVENUE", "MUNICIPAL", "FEDERAL", "BUREAU OF", "COMMISSION", "AUTHORITY",
];

/// Tokens/phrases indicating a rental-property or housing payee.
pub const APARTMENT_PHRASES: [&str; 12] = [
    "APARTMENTS", "APTS", "PROPERTIES", "PROPERTY MANAGEMENT", "ESTATES", "VILLAS", "TOWNHOMES",
    "CONDOS", "RESIDENCES", "SUITES", "PLAZA", "MANOR",
];

pub const ARTICLES: [&str; 3] = ["THE", "A", "AN"];

static TAX_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{9}").unwrap());

static FIRST_NAME_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FIRST_NAMES.iter().copied().collect());
static SUFFIX_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| LEGAL_SUFFIXES.iter().copied().collect());
static KEYWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| BUSINESS_KEYWORDS.iter().copied().collect());
static HONORIFIC_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HONORIFICS.iter().copied().collect());
static GENERATION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| GENERATION_SUFFIXES.iter().copied().collect());

/// Derive the fixed-shape feature record for a normalized name. The
/// org/person probabilities are filled in from the injected signal provider;
/// everything else is deterministic token and substring lookups.
pub fn extract_features(
    normalized: &NormalizedName,
    provider: &dyn EntitySignalProvider,
) -> FeatureFlags {
    if normalized.is_empty() {
        return FeatureFlags::default();
    }

    let tokens: Vec<&str> = normalized.tokens.iter().map(|t| t.as_str()).collect();
    let text = normalized.text.as_str();

    let business_suffix = tokens.iter().any(|t| SUFFIX_SET.contains(t));
    let business_keyword = tokens.iter().any(|t| KEYWORD_SET.contains(t));
    let honorific = tokens
        .first()
        .map(|t| HONORIFIC_SET.contains(t))
        .unwrap_or(false);
    let generation_suffix = tokens
        .last()
        .map(|t| GENERATION_SET.contains(t))
        .unwrap_or(false);
    let ampersand = tokens.iter().any(|t| *t == "AND");
    let first_name_match = tokens.iter().any(|t| FIRST_NAME_SET.contains(t));
    let tax_id_pattern = TAX_ID_REGEX.is_match(text);
    let government_pattern = GOVERNMENT_PHRASES.iter().any(|p| {
        if p.contains(' ') {
            text.contains(p)
        } else {
            tokens.contains(p)
        }
    });
    let apartment_pattern = APARTMENT_PHRASES.iter().any(|p| {
        if p.contains(' ') {
            text.contains(p)
        } else {
            tokens.contains(p)
        }
    });
    let starts_with_article = tokens
        .first()
        .map(|t| ARTICLES.contains(t))
        .unwrap_or(false);
    let multiple_last_names = detect_multiple_last_names(&tokens);

    let signals = provider.signals(normalized);

    FeatureFlags {
        business_suffix,
        honorific,
        generation_suffix,
        ampersand,
        business_keyword,
        first_name_match,
        tax_id_pattern,
        token_count: tokens.len(),
        government_pattern,
        apartment_pattern,
        starts_with_article,
        multiple_last_names,
        org_probability: signals.org_probability,
        person_probability: signals.person_probability,
    }
}

/// Three or more alphabetic tokens with a leading given name and no business
/// vocabulary reads as a multi-surname personal name (common for hyphenated
/// or Hispanic naming conventions before punctuation collapse).
fn detect_multiple_last_names(tokens: &[&str]) -> bool {
    if tokens.len() < 3 {
        return false;
    }
    let first_is_given = tokens
        .first()
        .map(|t| FIRST_NAME_SET.contains(t))
        .unwrap_or(false);
    let all_plain = tokens.iter().all(|t| {
        t.chars().all(|c| c.is_alphabetic() || c == '\'')
            && !SUFFIX_SET.contains(t)
            && !KEYWORD_SET.contains(t)
    });
    first_is_given && all_plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::normalizer::normalize;
    use crate::classify::signals::HeuristicSignalProvider;

    fn features_for(raw: &str) -> FeatureFlags {
        let provider = HeuristicSignalProvider::default();
        extract_features(&normalize(raw), &provider)
    }

    #[test]
    fn test_business_suffix_and_keyword() {
        let features = features_for("Apex Plumbing Services LLC");
        assert!(features.business_suffix);
        assert!(features.business_keyword);
        assert!(!features.honorific);
        assert_eq!(features.token_count, 4);
    }

    #[test]
    fn test_person_signals() {
        let features = features_for("Dr. John A. Smith III");
        assert!(features.honorific);
        assert!(features.first_name_match);
        assert!(features.generation_suffix);
        assert!(!features.business_suffix);
    }

    #[test]
    fn test_ampersand_standardization_feeds_flag() {
        assert!(features_for("Smith & Wesson Holdings").ampersand);
        assert!(features_for("Johnson and Johnson").ampersand);
        assert!(!features_for("Jane Smith").ampersand);
    }

    #[test]
    fn test_tax_id_pattern() {
        assert!(features_for("Vendor 123456789").tax_id_pattern);
        assert!(!features_for("Vendor 12345678").tax_id_pattern);
        // Nine digits must be consecutive; spaced groups don't count.
        assert!(!features_for("Vendor 123 456 789").tax_id_pattern);
    }

    #[test]
    fn test_government_and_apartment_patterns() {
        assert!(features_for("City of Springfield").government_pattern);
        assert!(features_for("Lakeside Apartments").apartment_pattern);
        assert!(features_for("Oak Manor Residences").apartment_pattern);
        assert!(!features_for("John Doe").government_pattern);
    }

    #[test]
    fn test_starts_with_article() {
        assert!(features_for("The Home Depot").starts_with_article);
        assert!(!features_for("Home Depot").starts_with_article);
    }

    #[test]
    fn test_multiple_last_names() {
        assert!(features_for("Maria Garcia Lopez").multiple_last_names);
        assert!(!features_for("Maria Garcia").multiple_last_names);
        assert!(!features_for("Maria Garcia LLC").multiple_last_names);
    }

    #[test]
    fn test_empty_input_yields_default() {
        let features = features_for("");
        assert_eq!(features.token_count, 0);
        assert!(!features.business_suffix);
        assert_eq!(features.org_probability, 0.0);
    }
}
