// src/config.rs - Classifier configuration, environment-driven with sane defaults
use log::debug;
use std::env;

/// Confidence a tier must reach before the cascade stops there.
pub const MEDIUM_CONFIDENCE_THRESHOLD: u8 = 85;

/// Recognized configuration surface for classification and batch runs.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Confidence floor a deterministic tier must reach before the AI tier
    /// is skipped.
    pub ai_threshold: u8,
    /// Skip the rule-based/fuzzy/heuristic tiers and go straight to AI.
    pub bypass_rule_nlp: bool,
    /// Disable the AI tier entirely.
    pub offline_mode: bool,
    /// Enable the fuzzy-match tier and the dedup fuzzy path.
    pub use_fuzzy_matching: bool,
    /// Combined-similarity threshold for fuzzy duplicates, in [0, 100].
    pub similarity_threshold: f64,
    /// Maximum chunks processed concurrently.
    pub max_concurrency: usize,
    /// Maximum items per chunk (and per AI request).
    pub max_batch_size: usize,
    /// Keywords that short-circuit classification at the exclusion tier.
    pub exclusion_keywords: Vec<String>,
    /// Classification cache sizing.
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ai_threshold: MEDIUM_CONFIDENCE_THRESHOLD,
            bypass_rule_nlp: false,
            offline_mode: false,
            use_fuzzy_matching: true,
            similarity_threshold: 90.0,
            max_concurrency: 3,
            max_batch_size: 15,
            exclusion_keywords: Vec::new(),
            cache_capacity: 10_000,
            cache_ttl_secs: 3600,
        }
    }
}

impl ClassifierConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            ai_threshold: env_parse("PAYEE_AI_THRESHOLD", defaults.ai_threshold),
            bypass_rule_nlp: env_parse("PAYEE_BYPASS_RULE_NLP", defaults.bypass_rule_nlp),
            offline_mode: env_parse("PAYEE_OFFLINE_MODE", defaults.offline_mode),
            use_fuzzy_matching: env_parse("PAYEE_USE_FUZZY_MATCHING", defaults.use_fuzzy_matching),
            similarity_threshold: env_parse(
                "PAYEE_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            max_concurrency: env_parse("PAYEE_MAX_CONCURRENCY", defaults.max_concurrency).max(1),
            max_batch_size: env_parse("PAYEE_MAX_BATCH_SIZE", defaults.max_batch_size).max(1),
            exclusion_keywords: env::var("PAYEE_EXCLUSION_KEYWORDS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            cache_capacity: env_parse("PAYEE_CACHE_CAPACITY", defaults.cache_capacity).max(1),
            cache_ttl_secs: env_parse("PAYEE_CACHE_TTL_SECS", defaults.cache_ttl_secs),
        };
        debug!("Classifier config: {:?}", config);
        config
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}
