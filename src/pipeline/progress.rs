// src/pipeline/progress.rs - Progress callback surface for batch runs
use std::sync::Arc;

/// Which phase of the batch run a progress update describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Deduplicating,
    Classifying,
    Retrying,
    Materializing,
    Complete,
}

impl BatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::Deduplicating => "deduplicating",
            BatchPhase::Classifying => "classifying",
            BatchPhase::Retrying => "retrying",
            BatchPhase::Materializing => "materializing",
            BatchPhase::Complete => "complete",
        }
    }
}

/// One progress report, emitted after each processed chunk and at phase
/// boundaries.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percentage: f64,
    pub phase: BatchPhase,
}

impl ProgressUpdate {
    pub fn new(processed: usize, total: usize, phase: BatchPhase) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        Self {
            processed,
            total,
            percentage,
            phase,
        }
    }
}

/// Callback type for progress sinks.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;
