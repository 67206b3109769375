// src/pipeline/batch.rs - Bounded-concurrency batch orchestration
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::cache::SharedClassificationCache;
use crate::classify::normalizer::comparison_key;
use crate::models::{
    BatchItemResult, BatchResult, BatchStats, ClassificationResult, DuplicateKind,
    ProcessingQueueItem,
};
use crate::pipeline::dedup::deduplicate;
use crate::pipeline::escalation::EscalationPolicy;
use crate::pipeline::progress::{BatchPhase, ProgressCallback, ProgressUpdate};

/// Delay before the second attempt for items whose AI tier failed.
const RETRY_DELAY_MS: u64 = 250;

/// Run a full batch: dedup, chunked bounded-concurrency classification,
/// delayed offline retry for AI failures, duplicate materialization, and
/// realignment to input order. The returned results always correspond 1:1
/// with the input; the alignment invariant is asserted fatally because a
/// silent misalignment would corrupt downstream reporting.
pub async fn process_batch(
    policy: Arc<EscalationPolicy>,
    cache: SharedClassificationCache,
    names: &[String],
    rows: Option<&[serde_json::Value]>,
    progress: Option<ProgressCallback>,
) -> Result<BatchResult> {
    let started = Instant::now();
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now().naive_utc();
    let total = names.len();
    let config = policy.config().clone();
    info!(
        "Batch {}: {} names, concurrency={}, chunk_size={}",
        run_id, total, config.max_concurrency, config.max_batch_size
    );

    let report = |processed: usize, phase: BatchPhase| {
        if let Some(callback) = &progress {
            callback(ProgressUpdate::new(processed, total, phase));
        }
    };

    report(0, BatchPhase::Deduplicating);
    let dedup_outcome = deduplicate(
        names,
        rows,
        config.use_fuzzy_matching,
        config.similarity_threshold,
    );
    let exact_duplicates = dedup_outcome
        .duplicate_map
        .values()
        .filter(|d| d.kind == DuplicateKind::Exact)
        .count();
    let fuzzy_duplicates = dedup_outcome.duplicate_map.len() - exact_duplicates;
    let unique_count = dedup_outcome.work_queue.len();

    // Chunk the unique work and fan out under a semaphore. Each task owns
    // its chunk's items, reports its chunk done as it finishes, and returns
    // (item, result, ai_failed) triples; the harvest loop below is the only
    // writer of the result map. Limits are clamped so a zero in a
    // hand-built config degrades to serial processing instead of panicking.
    let chunk_size = config.max_batch_size.max(1);
    let concurrency = config.max_concurrency.max(1);
    let chunks: Vec<Vec<ProcessingQueueItem>> = dedup_outcome
        .work_queue
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    let chunk_count = chunks.len();
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let processed_counter = Arc::new(AtomicUsize::new(0));
    let mut ai_batches = 0usize;

    report(0, BatchPhase::Classifying);
    let mut tasks = Vec::with_capacity(chunk_count);
    for chunk in chunks {
        let semaphore = semaphore.clone();
        let policy = policy.clone();
        let cache = cache.clone();
        let progress = progress.clone();
        let counter = processed_counter.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore closed mid-batch");
            let outcomes = policy.classify_chunk(&chunk, &cache).await;
            // Report from inside the task so the callback sees each chunk
            // land in real time rather than a burst at harvest.
            let done = counter.fetch_add(chunk.len(), Ordering::SeqCst) + chunk.len();
            if let Some(callback) = &progress {
                callback(ProgressUpdate::new(done, total, BatchPhase::Classifying));
            }
            let mut resolved = Vec::with_capacity(chunk.len());
            for (item, outcome) in chunk.into_iter().zip(outcomes) {
                resolved.push((item, outcome.result, outcome.ai_failed));
            }
            resolved
        }));
    }

    let mut unique_results: HashMap<usize, ClassificationResult> = HashMap::new();
    let mut retry_items: Vec<ProcessingQueueItem> = Vec::new();
    let mut processed_unique = 0usize;

    for joined in join_all(tasks).await {
        let resolved = match joined {
            Ok(resolved) => resolved,
            Err(join_error) => {
                // A panicked chunk task is a programmer error; surface it
                // rather than fabricating results.
                return Err(anyhow::anyhow!("chunk task panicked: {}", join_error));
            }
        };
        let used_ai = resolved
            .iter()
            .any(|(_, result, _)| result.tier == crate::models::ProcessingTier::AiAssisted);
        if used_ai {
            ai_batches += 1;
        }
        for (item, result, ai_failed) in resolved {
            processed_unique += 1;
            if ai_failed {
                retry_items.push(item.clone());
            }
            // Seed the process-wide cache so later batches (and the fuzzy
            // tier) can reuse confident results.
            let key = comparison_key(&item.name);
            if !key.is_empty() && result.confidence >= config.ai_threshold {
                cache.lock().await.put(key, result.clone());
            }
            unique_results.insert(item.original_index, result);
        }
    }

    // Second attempt for AI-failed items: offline tiers only, after a short
    // delay. Degradation, not abort.
    let retried_items = retry_items.len();
    if !retry_items.is_empty() {
        warn!(
            "Batch {}: retrying {} items offline after AI failure",
            run_id, retried_items
        );
        report(processed_unique, BatchPhase::Retrying);
        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
        let cached = { cache.lock().await.snapshot() };
        for item in retry_items {
            let evaluation = policy.evaluate_sync(&item.name, &cached);
            let mut result = evaluation.result;
            result.confidence = result
                .confidence
                .max(crate::pipeline::escalation::AI_FALLBACK_MIN_CONFIDENCE);
            unique_results.insert(item.original_index, result);
        }
    }

    // Materialize duplicates from their canonical results.
    report(processed_unique, BatchPhase::Materializing);
    let mut results: Vec<BatchItemResult> = Vec::with_capacity(total);
    for (index, name) in names.iter().enumerate() {
        let row = rows.and_then(|r| r.get(index)).cloned();
        if let Some(result) = unique_results.get(&index) {
            results.push(BatchItemResult {
                original_index: index,
                name: name.clone(),
                result: result.clone(),
                row,
                duplicate_of: None,
            });
        } else if let Some(duplicate) = dedup_outcome.duplicate_map.get(&index) {
            let canonical = unique_results
                .get(&duplicate.canonical_index)
                .expect("duplicate references a processed unique item");
            let mut result = canonical.clone();
            match duplicate.kind {
                DuplicateKind::Exact => {
                    result.matching_rules.push(format!(
                        "duplicate_of:{}",
                        duplicate.canonical_index
                    ));
                }
                DuplicateKind::Fuzzy => {
                    result.matching_rules.push(format!(
                        "fuzzy_duplicate_of:{}:{:.0}",
                        duplicate.canonical_index, duplicate.similarity
                    ));
                }
            }
            results.push(BatchItemResult {
                original_index: index,
                name: name.clone(),
                result,
                row,
                duplicate_of: Some(duplicate.canonical_index),
            });
        } else {
            // Unreachable by construction; tripping it means dedup and
            // classification disagree about coverage.
            panic!("no result for input index {}", index);
        }
    }

    results.sort_by_key(|r| r.original_index);
    assert_alignment(&results, total);

    let mut tier_counts: HashMap<String, usize> = HashMap::new();
    for item in &results {
        *tier_counts
            .entry(item.result.tier.as_str().to_string())
            .or_insert(0) += 1;
    }

    let stats = BatchStats {
        run_id: run_id.clone(),
        started_at,
        total,
        unique_processed: unique_count,
        exact_duplicates,
        fuzzy_duplicates,
        tier_counts,
        ai_batches,
        retried_items,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Batch {} complete: {} results in {}ms ({} unique, {} exact dup, {} fuzzy dup, {} retried)",
        run_id, total, stats.elapsed_ms, unique_count, exact_duplicates, fuzzy_duplicates,
        retried_items
    );
    report(total, BatchPhase::Complete);

    Ok(BatchResult { results, stats })
}

/// The alignment invariant: exactly one result per input, indices forming
/// a gap-free permutation of 0..n-1. Violations are programmer errors and
/// abort rather than risk silently misaligned output.
fn assert_alignment(results: &[BatchItemResult], expected: usize) {
    assert_eq!(
        results.len(),
        expected,
        "alignment violation: {} results for {} inputs",
        results.len(),
        expected
    );
    for (position, item) in results.iter().enumerate() {
        assert_eq!(
            item.original_index, position,
            "alignment violation: index {} at position {}",
            item.original_index, position
        );
    }
}
