// src/exclusion.rs - Keyword exclusion filter that can short-circuit classification
use log::debug;

use crate::similarity::{combined_similarity, jaro_winkler_similarity};

/// String-level similarity a keyword must reach against the whole name for
/// a fuzzy exclusion, and the tighter bound for single-token matches.
const FUZZY_STRING_THRESHOLD: f64 = 85.0;
const FUZZY_TOKEN_THRESHOLD: f64 = 90.0;

const EXACT_MATCH_CONFIDENCE: u8 = 95;

/// Outcome of an exclusion check.
#[derive(Debug, Clone)]
pub struct ExclusionCheck {
    pub is_excluded: bool,
    pub matched_keywords: Vec<String>,
    pub confidence: u8,
    pub reasoning: String,
}

impl ExclusionCheck {
    fn clear() -> Self {
        Self {
            is_excluded: false,
            matched_keywords: Vec::new(),
            confidence: 0,
            reasoning: String::new(),
        }
    }
}

/// Case-insensitive keyword filter. The simple variant stops at the first
/// substring hit; the enhanced variant also accepts near-miss keywords via
/// string and token similarity. An empty keyword list never excludes.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    keywords: Vec<String>,
    fuzzy: bool,
}

impl ExclusionFilter {
    pub fn new(keywords: Vec<String>, fuzzy: bool) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            fuzzy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn check(&self, name: &str) -> ExclusionCheck {
        if self.keywords.is_empty() || name.trim().is_empty() {
            return ExclusionCheck::clear();
        }
        let lowered = name.to_lowercase();

        for keyword in &self.keywords {
            if lowered.contains(keyword.as_str()) {
                debug!("Exclusion keyword '{}' matched '{}'", keyword, name);
                return ExclusionCheck {
                    is_excluded: true,
                    matched_keywords: vec![keyword.clone()],
                    confidence: EXACT_MATCH_CONFIDENCE,
                    reasoning: format!("Excluded: name contains keyword '{}'", keyword),
                };
            }
        }

        if self.fuzzy {
            if let Some(check) = self.check_fuzzy(&lowered) {
                return check;
            }
        }

        ExclusionCheck::clear()
    }

    fn check_fuzzy(&self, lowered: &str) -> Option<ExclusionCheck> {
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        for keyword in &self.keywords {
            let whole = combined_similarity(lowered, keyword).combined;
            if whole >= FUZZY_STRING_THRESHOLD {
                return Some(ExclusionCheck {
                    is_excluded: true,
                    matched_keywords: vec![keyword.clone()],
                    confidence: whole.round() as u8,
                    reasoning: format!(
                        "Excluded: name is {:.0}% similar to keyword '{}'",
                        whole, keyword
                    ),
                });
            }
            for token in &tokens {
                let token_score = jaro_winkler_similarity(token, keyword);
                if token_score >= FUZZY_TOKEN_THRESHOLD {
                    return Some(ExclusionCheck {
                        is_excluded: true,
                        matched_keywords: vec![keyword.clone()],
                        confidence: token_score.round() as u8,
                        reasoning: format!(
                            "Excluded: token '{}' is {:.0}% similar to keyword '{}'",
                            token, token_score, keyword
                        ),
                    });
                }
            }
        }
        None
    }
}
