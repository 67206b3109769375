// src/pipeline/escalation.rs - Ordered tier cascade from exclusion to AI
use log::{debug, warn};
use std::sync::Arc;

use crate::ai::AiClassificationClient;
use crate::cache::SharedClassificationCache;
use crate::classify::confidence::calibrate;
use crate::classify::features::extract_features;
use crate::classify::heuristic::structural_classify;
use crate::classify::normalizer::{comparison_key, normalize};
use crate::classify::rationale::explain;
use crate::classify::scoring::{score, ScoringWeights};
use crate::classify::signals::EntitySignalProvider;
use crate::config::ClassifierConfig;
use crate::exclusion::ExclusionFilter;
use crate::models::{
    Classification, ClassificationResult, ProcessingQueueItem, ProcessingTier,
};
use crate::similarity::combined_similarity;

/// Confidence floor applied when the AI tier fails and a lower-tier result
/// is returned in its place.
pub const AI_FALLBACK_MIN_CONFIDENCE: u8 = 51;

/// Result of the synchronous tiers for one name.
#[derive(Debug, Clone)]
pub struct SyncEvaluation {
    pub result: ClassificationResult,
    /// True when a tier reached the confidence bar and the cascade stopped.
    pub terminal: bool,
}

/// Per-item outcome of a chunk pass.
#[derive(Debug, Clone)]
pub struct EscalationOutcome {
    pub result: ClassificationResult,
    /// Set when the AI tier was wanted but failed; the orchestrator may
    /// enqueue a delayed offline second attempt.
    pub ai_failed: bool,
}

/// The ordered tier cascade. Tiers 1-4 are pure synchronous computation;
/// only the AI tier performs I/O. Every tier either terminates with a
/// confident result or falls through, and per-item failures are absorbed
/// into degraded results rather than propagated.
pub struct EscalationPolicy {
    config: ClassifierConfig,
    weights: ScoringWeights,
    exclusion: ExclusionFilter,
    provider: Arc<dyn EntitySignalProvider>,
    ai_client: Arc<AiClassificationClient>,
}

impl EscalationPolicy {
    pub fn new(
        config: ClassifierConfig,
        provider: Arc<dyn EntitySignalProvider>,
        ai_client: Arc<AiClassificationClient>,
    ) -> Self {
        let exclusion = ExclusionFilter::new(
            config.exclusion_keywords.clone(),
            config.use_fuzzy_matching,
        );
        Self {
            config,
            weights: ScoringWeights::default(),
            exclusion,
            provider,
            ai_client,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Run the deterministic tiers in order. Each tier is a function from
    /// the name to an optional candidate; the first candidate meeting the
    /// confidence bar (or coming from an always-terminal tier) stops the
    /// cascade, and the best candidate so far is kept otherwise.
    pub fn evaluate_sync(
        &self,
        name: &str,
        cached: &[(String, ClassificationResult)],
    ) -> SyncEvaluation {
        // Tier 1: exclusion is terminal whenever it matches.
        if let Some(result) = self.tier_excluded(name) {
            return SyncEvaluation {
                result,
                terminal: true,
            };
        }

        // Invalid input never escalates; it gets the minimum-confidence
        // default and stops here.
        if normalize(name).is_empty() {
            return SyncEvaluation {
                result: ClassificationResult::invalid_input(),
                terminal: true,
            };
        }

        type TierFn<'a> = Box<dyn Fn(&str) -> Option<ClassificationResult> + 'a>;
        let tiers: Vec<(ProcessingTier, TierFn<'_>)> = if self.config.bypass_rule_nlp {
            Vec::new()
        } else {
            vec![
                (
                    ProcessingTier::RuleBased,
                    Box::new(|n: &str| Some(self.tier_rule_based(n))),
                ),
                (
                    ProcessingTier::FuzzyMatch,
                    Box::new(|n: &str| self.tier_fuzzy_match(n, cached)),
                ),
                (
                    ProcessingTier::Heuristic,
                    Box::new(|n: &str| Some(structural_classify(n))),
                ),
            ]
        };

        let mut best: Option<ClassificationResult> = None;
        for (tier, evaluate) in tiers {
            if let Some(candidate) = evaluate(name) {
                debug!(
                    "Tier {} produced {} at {} for '{}'",
                    tier.as_str(),
                    candidate.classification.as_str(),
                    candidate.confidence,
                    name
                );
                if candidate.confidence >= self.config.ai_threshold {
                    return SyncEvaluation {
                        result: candidate,
                        terminal: true,
                    };
                }
                let better = best
                    .as_ref()
                    .map(|b| candidate.confidence > b.confidence)
                    .unwrap_or(true);
                if better {
                    best = Some(candidate);
                }
            }
        }

        SyncEvaluation {
            result: best.unwrap_or_else(|| self.tier_rule_based(name)),
            terminal: false,
        }
    }

    fn tier_excluded(&self, name: &str) -> Option<ClassificationResult> {
        let check = self.exclusion.check(name);
        if !check.is_excluded {
            return None;
        }
        Some(ClassificationResult {
            classification: Classification::Business,
            confidence: check.confidence,
            reasoning: check.reasoning,
            tier: ProcessingTier::Excluded,
            matching_rules: check
                .matched_keywords
                .iter()
                .map(|k| format!("exclusion:{}", k))
                .collect(),
        })
    }

    fn tier_rule_based(&self, name: &str) -> ClassificationResult {
        let normalized = normalize(name);
        let features = extract_features(&normalized, self.provider.as_ref());
        let outcome = score(&features, &self.weights);
        let confidence = calibrate(outcome.raw_score, &features);
        let (reasoning, matching_rules) = explain(&features);
        ClassificationResult {
            classification: outcome.classification,
            confidence,
            reasoning,
            tier: ProcessingTier::RuleBased,
            matching_rules,
        }
    }

    fn tier_fuzzy_match(
        &self,
        name: &str,
        cached: &[(String, ClassificationResult)],
    ) -> Option<ClassificationResult> {
        if !self.config.use_fuzzy_matching || cached.is_empty() {
            return None;
        }
        let key = comparison_key(name);
        let best = cached
            .iter()
            .map(|(cached_key, result)| {
                (
                    combined_similarity(&key, cached_key).combined,
                    cached_key,
                    result,
                )
            })
            .filter(|(similarity, _, _)| *similarity >= self.config.similarity_threshold)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))?;

        let (similarity, matched_key, cached_result) = best;
        let confidence = (cached_result.confidence as f64).min(similarity).round() as u8;
        Some(ClassificationResult {
            classification: cached_result.classification,
            confidence,
            reasoning: format!(
                "Matches previously classified '{}' at {:.0}% similarity",
                matched_key, similarity
            ),
            tier: ProcessingTier::FuzzyMatch,
            matching_rules: vec![format!("fuzzy_cache:{}", matched_key)],
        })
    }

    /// Classify one chunk of unique work. Exact cache hits resolve first,
    /// then the synchronous tiers; the remainder goes to the AI collaborator
    /// in a single batched call. AI failure never propagates: affected items
    /// keep their best lower-tier result, floored at the minimum fallback
    /// confidence.
    pub async fn classify_chunk(
        &self,
        items: &[ProcessingQueueItem],
        cache: &SharedClassificationCache,
    ) -> Vec<EscalationOutcome> {
        // One lock pass for the whole chunk: exact lookups per item plus the
        // snapshot the fuzzy tier scans.
        let (exact_hits, cached) = {
            let mut store = cache.lock().await;
            let hits: Vec<Option<ClassificationResult>> = items
                .iter()
                .map(|item| {
                    let key = comparison_key(&item.name);
                    if key.is_empty() {
                        None
                    } else {
                        store.get(&key)
                    }
                })
                .collect();
            (hits, store.snapshot())
        };

        let mut outcomes: Vec<Option<EscalationOutcome>> = vec![None; items.len()];
        let mut pending: Vec<(usize, ClassificationResult)> = Vec::new();

        for (slot, item) in items.iter().enumerate() {
            if let Some(result) = exact_hits[slot].clone() {
                debug!("Exact cache hit for '{}'", item.name);
                outcomes[slot] = Some(EscalationOutcome {
                    result,
                    ai_failed: false,
                });
                continue;
            }
            let evaluation = self.evaluate_sync(&item.name, &cached);
            if evaluation.terminal {
                outcomes[slot] = Some(EscalationOutcome {
                    result: evaluation.result,
                    ai_failed: false,
                });
            } else {
                pending.push((slot, evaluation.result));
            }
        }

        if !pending.is_empty() {
            if self.config.offline_mode || !self.ai_client.is_configured() {
                for (slot, fallback) in pending {
                    outcomes[slot] = Some(EscalationOutcome {
                        result: fallback,
                        ai_failed: false,
                    });
                }
            } else {
                let names: Vec<String> = pending
                    .iter()
                    .map(|(slot, _)| items[*slot].name.clone())
                    .collect();
                match self.ai_client.classify_batch(&names).await {
                    Ok(ai_results) => {
                        for ((slot, _), result) in pending.into_iter().zip(ai_results) {
                            outcomes[slot] = Some(EscalationOutcome {
                                result,
                                ai_failed: false,
                            });
                        }
                    }
                    Err(error) => {
                        warn!("AI tier failed for chunk: {:#}", error);
                        for (slot, fallback) in pending {
                            let mut result = fallback;
                            result.confidence =
                                result.confidence.max(AI_FALLBACK_MIN_CONFIDENCE);
                            result
                                .matching_rules
                                .push("ai_unavailable_fallback".to_string());
                            outcomes[slot] = Some(EscalationOutcome {
                                result,
                                ai_failed: true,
                            });
                        }
                    }
                }
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| outcome.expect("every chunk slot resolved"))
            .collect()
    }
}
