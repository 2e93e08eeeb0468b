//! Actionable output derived from a single soil snapshot.

pub mod alerts;
pub mod fertilizer;

pub use alerts::{AlertEvaluator, AlertReport};
pub use fertilizer::FertilizerAdvisor;
