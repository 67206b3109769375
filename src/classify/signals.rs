// src/classify/signals.rs - Pluggable entity-recognition signal provider
use crate::classify::features::{
    BUSINESS_KEYWORDS, FIRST_NAMES, GENERATION_SUFFIXES, HONORIFICS, LEGAL_SUFFIXES,
};
use crate::models::NormalizedName;

/// Org/person probabilities for a payee name, each in [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySignals {
    pub org_probability: f64,
    pub person_probability: f64,
}

/// Capability seam for named-entity recognition. The scoring engine only
/// reads the two probabilities, so a real recognizer can replace the default
/// heuristic without touching scoring logic.
pub trait EntitySignalProvider: Send + Sync {
    fn signals(&self, normalized: &NormalizedName) -> EntitySignals;
}

/// Default deterministic provider. Accumulates probability mass from the
/// same structural cues a lightweight NER would key on; no randomness, so
/// identical input always yields identical signals.
#[derive(Debug, Clone)]
pub struct HeuristicSignalProvider {
    base: f64,
}

impl Default for HeuristicSignalProvider {
    fn default() -> Self {
        Self { base: 0.30 }
    }
}

impl EntitySignalProvider for HeuristicSignalProvider {
    fn signals(&self, normalized: &NormalizedName) -> EntitySignals {
        if normalized.is_empty() {
            return EntitySignals::default();
        }
        let tokens: Vec<&str> = normalized.tokens.iter().map(|t| t.as_str()).collect();

        let mut org = self.base;
        if tokens.iter().any(|t| LEGAL_SUFFIXES.contains(t)) {
            org += 0.35;
        }
        if tokens.iter().any(|t| BUSINESS_KEYWORDS.contains(t)) {
            org += 0.20;
        }
        if tokens.contains(&"AND") {
            org += 0.10;
        }
        if tokens.len() >= 4 {
            org += 0.05;
        }

        let mut person = self.base;
        if tokens.iter().any(|t| FIRST_NAMES.contains(t)) {
            person += 0.35;
        }
        if tokens
            .first()
            .map(|t| HONORIFICS.contains(t))
            .unwrap_or(false)
        {
            person += 0.20;
        }
        if tokens
            .last()
            .map(|t| GENERATION_SUFFIXES.contains(t))
            .unwrap_or(false)
        {
            person += 0.15;
        }
        if tokens.len() == 2 {
            person += 0.10;
        }

        EntitySignals {
            org_probability: org.clamp(0.02, 0.98),
            person_probability: person.clamp(0.02, 0.98),
        }
    }
}
