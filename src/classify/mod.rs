// src/classify/mod.rs
pub mod confidence;
pub mod features;
pub mod heuristic;
pub mod normalizer;
pub mod rationale;
pub mod scoring;
pub mod signals;
