//! Quality scoring for LLM responses.
//!
//! Provides a [`QualityScorer`] trait for evaluating the quality of responses
//! and two implementations:
//!
//! - [`NoopScorer`] -- Always returns a neutral score (0.5). Use when the
//!   `rvf` feature is enabled but no real scorer is configured.
//! - [`BasicScorer`] -- Heuristic scorer that evaluates response quality based
//!   on length, error indicators, and tool usage patterns.
//!
//! These are *standalone* scorers for the RVF integration layer. They are
//! separate from the pipeline scorer in [`crate::pipeline::scorer`] which
//! operates on typed LLM request/response pairs.
//!
//! This module is gated behind the `rvf` feature flag.

// ── Trait ──────────────────────────────────────────────────────────────

/// Evaluate and record quality scores for LLM request/response pairs.
pub trait QualityScorer: Send + Sync {
    /// Score a response given its originating request.
    ///
    /// Returns a value in `0.0..=1.0` where higher is better.
    fn score(&self, request: &str, response: &str) -> f32;

    /// Record a scored observation for future reference.
    fn record(&mut self, request: &str, response: &str, score: f32);
}

// ── NoopScorer ─────────────────────────────────────────────────────────

/// No-op scorer that always returns `0.5`.
///
/// Suitable as a default placeholder when no real quality model is loaded.
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
    fn score(&self, _request: &str, _response: &str) -> f32 {
        0.5
    }

    fn record(&mut self, _request: &str, _response: &str, _score: f32) {
        // No-op.
    }
}

// ── BasicScorer ────────────────────────────────────────────────────────

/// Heuristic quality scorer.
///
/// Evaluates response quality using three signals:
///
/// 1. **Length** -- Longer responses score higher (up to 500 words), because
///    very short answers often indicate a refusal or lack of information.
/// 2. **Error indicators** -- Phrases like "I can't", "I don't know", or
///    "I'm unable" reduce the score.
/// 3. **Tool usage** -- Presence of tool invocation patterns (JSON objects
///    with `"tool_use"` or `"function"` keys) increases the score, as it
///    indicates the model is actively fulfilling the request.
pub struct BasicScorer {
    /// History of `(request_hash, score)` pairs for trend analysis.
    history: Vec<(u64, f32)>,
}

impl BasicScorer {
    /// Create a new basic scorer with an empty history.
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
        }
    }

    /// Return a read-only view of the scoring history.
    pub fn history(&self) -> &[(u64, f32)] {
        &self.history
    }
}

impl Default for BasicScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer for BasicScorer {
    fn score(&self, _request: &str, response: &str) -> f32 {
        let lower = response.to_lowercase();
        let word_count = lower.split_whitespace().count();

        // Length component: 0.0 for empty, up to 0.4 at 500+ words.
        let length_score = (word_count as f32 / 500.0).min(1.0) * 0.4;

        // Error-indicator penalty: up to -0.3.
        let error_phrases = [
            "i can't",
            "i cannot",
            "i don't know",
            "i'm unable",
            "i am unable",
            "as an ai",
            "i'm not able",
        ];
        let error_penalty = if error_phrases.iter().any(|p| lower.contains(p)) {
            0.3
        } else {
            0.0
        };

        // Tool-use bonus: +0.2 if the response contains tool-invocation patterns.
        let tool_bonus = if lower.contains("tool_use") || lower.contains("\"function\"") {
            0.2
        } else {
            0.0
        };

        // Base of 0.3 (non-empty response is worth something).
        let base = if word_count > 0 { 0.3 } else { 0.0 };

        (base + length_score + tool_bonus - error_penalty).clamp(0.0, 1.0)
    }

    fn record(&mut self, request: &str, _response: &str, score: f32) {
        let hash = simple_hash(request);
        self.history.push((hash, score));
    }
}

/// Cheap non-cryptographic hash for request deduplication.
fn simple_hash(s: &str) -> u64 {
    use std::hash::{DefaultHasher, Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

// ── Tests ──────────────────────────────────────────────────────────────
