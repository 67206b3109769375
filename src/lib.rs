// src/lib.rs - Payee name classification: Business vs Individual
//
// The engine is a cascade of deterministic feature-scoring tiers with an
// optional AI-assisted last resort, fronted by exact/fuzzy deduplication and
// a bounded-concurrency batch orchestrator that preserves strict 1:1 input
// alignment.
pub mod ai;
pub mod cache;
pub mod classify;
pub mod config;
pub mod exclusion;
pub mod models;
pub mod pipeline;
pub mod similarity;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::{AiClassificationClient, AiServiceConfig};
use crate::cache::{create_shared_cache, SharedClassificationCache};
use crate::classify::signals::{EntitySignalProvider, HeuristicSignalProvider};
use crate::config::ClassifierConfig;
use crate::models::{ProcessingQueueItem, SimilarityScores};
use crate::pipeline::escalation::EscalationPolicy;

pub use crate::models::{
    BatchItemResult, BatchResult, BatchStats, Classification, ClassificationResult,
    ProcessingTier,
};
pub use crate::pipeline::progress::{BatchPhase, ProgressCallback, ProgressUpdate};
pub use crate::similarity::combined_similarity;

/// The public classification surface: one escalation policy, one
/// process-wide result cache, constructed once and reused across calls.
pub struct PayeeClassifier {
    policy: Arc<EscalationPolicy>,
    cache: SharedClassificationCache,
}

impl PayeeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_provider(config, Arc::new(HeuristicSignalProvider::default()))
    }

    /// Build a classifier with a custom entity-signal provider, e.g. a real
    /// NER model in place of the default heuristic.
    pub fn with_provider(
        config: ClassifierConfig,
        provider: Arc<dyn EntitySignalProvider>,
    ) -> Self {
        let ai_client = Arc::new(AiClassificationClient::new(AiServiceConfig::from_env()));
        let cache = create_shared_cache(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let policy = Arc::new(EscalationPolicy::new(config, provider, ai_client));
        Self { policy, cache }
    }

    /// Classify a single payee name through the full escalation cascade.
    pub async fn classify(&self, name: &str) -> ClassificationResult {
        let item = ProcessingQueueItem {
            name: name.to_string(),
            original_index: 0,
            row: None,
        };
        let mut outcomes = self
            .policy
            .classify_chunk(std::slice::from_ref(&item), &self.cache)
            .await;
        outcomes.remove(0).result
    }

    /// Classify a whole batch with deduplication, bounded concurrency, and
    /// guaranteed input-order alignment. Optional `rows` are echoed back
    /// unmodified per result.
    pub async fn process_batch(
        &self,
        names: &[String],
        rows: Option<&[serde_json::Value]>,
        progress: Option<ProgressCallback>,
    ) -> Result<BatchResult> {
        pipeline::batch::process_batch(
            self.policy.clone(),
            self.cache.clone(),
            names,
            rows,
            progress,
        )
        .await
    }
}

/// All four similarity metrics plus their combined blend for a string pair.
pub fn similarity_scores(a: &str, b: &str) -> SimilarityScores {
    combined_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_classifier() -> PayeeClassifier {
        PayeeClassifier::new(ClassifierConfig {
            offline_mode: true,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_classify_business_example() {
        let classifier = offline_classifier();
        let result = classifier.classify("Apex Plumbing Services LLC").await;
        assert_eq!(result.classification, Classification::Business);
        assert!(result.confidence >= 85);
        assert!(result.reasoning.contains("business suffix"));
        assert!(result.reasoning.contains("business keyword"));
    }

    #[tokio::test]
    async fn test_classify_individual_example() {
        let classifier = offline_classifier();
        let result = classifier.classify("Dr. John A. Smith III").await;
        assert_eq!(result.classification, Classification::Individual);
        assert!(result.reasoning.contains("honorific"));
        assert!(result.reasoning.contains("generation suffix"));
    }

    #[tokio::test]
    async fn test_batch_public_api() {
        let classifier = offline_classifier();
        let names = vec![
            "".to_string(),
            "  ".to_string(),
            "Acme Inc".to_string(),
        ];
        let batch = classifier.process_batch(&names, None, None).await.unwrap();
        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.results[0].result.confidence, 0);
        assert_eq!(batch.results[1].result.confidence, 0);
        assert_eq!(
            batch.results[2].result.classification,
            Classification::Business
        );
    }

    #[test]
    fn test_similarity_public_api() {
        let scores = similarity_scores("Smith Consulting", "Smith Consultng");
        assert!(scores.combined >= 90.0);
    }
}
