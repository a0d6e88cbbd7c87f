//! No-op scorer (Level 0 implementation).
//!
//! Returns perfect quality scores for every response. Real scoring
//! will be implemented in Level 1+ with heuristics (response length,
//! format compliance) or Level 2+ with neural quality models.

use clawft_types::provider::LlmResponse;

use super::traits::{ChatRequest, QualityScore, QualityScorer};

/// Level 0 no-op quality scorer.
///
/// Always returns perfect scores (1.0 for all dimensions).
/// This serves as a baseline for the pipeline and will be replaced
/// by heuristic or ML-based scorers at higher levels.
pub struct NoopScorer;

impl NoopScorer {
    /// Create a new no-op scorer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer for NoopScorer {
    fn score(&self, _request: &ChatRequest, _response: &LlmResponse) -> QualityScore {
        QualityScore {
            overall: 1.0,
            relevance: 1.0,
            coherence: 1.0,
        }
    }
}
