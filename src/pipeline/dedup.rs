// src/pipeline/dedup.rs - Exact and fuzzy deduplication ahead of classification
use log::{debug, info};
use std::collections::HashMap;

use crate::classify::normalizer::comparison_key;
use crate::models::{DuplicateKind, DuplicateRef, ProcessingQueueItem};
use crate::similarity::combined_similarity;

/// Partition of a batch into unique work and duplicates deferring to a
/// prior occurrence.
#[derive(Debug)]
pub struct DeduplicationOutcome {
    pub work_queue: Vec<ProcessingQueueItem>,
    /// original_index of a duplicate -> reference to its canonical item.
    pub duplicate_map: HashMap<usize, DuplicateRef>,
}

/// Split `names` into a unique work queue and a duplicate map. An exact
/// repeat of a comparison key defers to the first occurrence; with fuzzy
/// matching enabled, a name whose combined similarity to any previously
/// accepted unique key reaches `similarity_threshold` defers to that key.
///
/// The fuzzy scan is O(n * u) over uniques accepted so far; callers only
/// see the outcome, so an indexed or blocking similarity structure can be
/// swapped in behind this signature.
pub fn deduplicate(
    names: &[String],
    rows: Option<&[serde_json::Value]>,
    use_fuzzy: bool,
    similarity_threshold: f64,
) -> DeduplicationOutcome {
    let mut work_queue: Vec<ProcessingQueueItem> = Vec::new();
    let mut duplicate_map: HashMap<usize, DuplicateRef> = HashMap::new();
    // comparison key -> original_index of first occurrence
    let mut seen: HashMap<String, usize> = HashMap::new();
    // accepted unique keys in insertion order, for the fuzzy scan
    let mut unique_keys: Vec<(String, usize)> = Vec::new();

    for (index, name) in names.iter().enumerate() {
        let row = rows.and_then(|r| r.get(index)).cloned();
        let key = comparison_key(name);

        // Empty keys never deduplicate against each other; each blank input
        // still gets its own (invalid-input) result slot.
        if key.is_empty() {
            work_queue.push(ProcessingQueueItem {
                name: name.clone(),
                original_index: index,
                row,
            });
            continue;
        }

        if let Some(&canonical_index) = seen.get(&key) {
            debug!(
                "Exact duplicate at index {}: '{}' repeats index {}",
                index, name, canonical_index
            );
            duplicate_map.insert(
                index,
                DuplicateRef {
                    canonical_index,
                    kind: DuplicateKind::Exact,
                    similarity: 100.0,
                },
            );
            continue;
        }

        if use_fuzzy {
            let fuzzy_hit = unique_keys
                .iter()
                .map(|(unique_key, canonical_index)| {
                    (
                        combined_similarity(&key, unique_key).combined,
                        *canonical_index,
                    )
                })
                .filter(|(similarity, _)| *similarity >= similarity_threshold)
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            if let Some((similarity, canonical_index)) = fuzzy_hit {
                debug!(
                    "Fuzzy duplicate at index {}: '{}' matches index {} at {:.1}",
                    index, name, canonical_index, similarity
                );
                duplicate_map.insert(
                    index,
                    DuplicateRef {
                        canonical_index,
                        kind: DuplicateKind::Fuzzy,
                        similarity,
                    },
                );
                continue;
            }
        }

        seen.insert(key.clone(), index);
        unique_keys.push((key, index));
        work_queue.push(ProcessingQueueItem {
            name: name.clone(),
            original_index: index,
            row,
        });
    }

    info!(
        "Deduplication: {} inputs -> {} unique, {} duplicates",
        names.len(),
        work_queue.len(),
        duplicate_map.len()
    );
    DeduplicationOutcome {
        work_queue,
        duplicate_map,
    }
}
