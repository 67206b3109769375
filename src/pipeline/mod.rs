// src/pipeline/mod.rs
pub mod batch;
pub mod dedup;
pub mod escalation;
pub mod progress;
