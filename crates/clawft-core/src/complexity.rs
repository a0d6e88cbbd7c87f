//! Task complexity analysis for model routing.
//!
//! Provides a [`TaskComplexityAnalyzer`] that estimates the complexity of a
//! task description using lightweight heuristics. The resulting score drives
//! the 3-tier routing decision in [`crate::intelligent_router`].
//!
//! This module is gated behind the `rvf` feature flag.

// ── TaskComplexityAnalyzer ─────────────────────────────────────────────

/// Estimates task complexity using surface-level text heuristics.
///
/// The analyser does **not** use an LLM or neural model. It relies on
/// properties of the input text that correlate with cognitive load:
///
/// - Task length (word count)
/// - Number of distinct requirements (sentence count)
/// - Technical-keyword density
/// - Multi-step indicators
///
/// All scores are returned in `0.0..=1.0`.
pub struct TaskComplexityAnalyzer;

impl TaskComplexityAnalyzer {
    /// Create a new analyser.
    pub fn new() -> Self {
        Self
    }

    /// Estimate the complexity of `task`.
    ///
    /// Returns a value in `0.0..=1.0`:
    /// - `0.0` -- trivial (e.g. "hello")
    /// - `0.3` -- moderate (short technical question)
    /// - `0.7+` -- very complex (multi-step, code-heavy, architectural)
    pub fn analyze(&self, task: &str) -> f32 {
        let lower = task.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let word_count = words.len();

        // Component 1: Length -- 0.0-0.25 based on word count.
        let length_score = (word_count as f32 / 200.0).min(1.0) * 0.25;

        // Component 2: Sentence count (proxy for requirement count).
        // We count sentence-ending punctuation.
        let sentence_count = lower
            .chars()
            .filter(|c| *c == '.' || *c == '?' || *c == '!' || *c == ';')
            .count()
            .max(1); // At least 1 sentence.
        let sentence_score = ((sentence_count as f32 - 1.0) / 5.0).clamp(0.0, 1.0) * 0.15;

        // Component 3: Technical keywords.
        let technical_keywords = [
            "api",
            "database",
            "schema",
            "authentication",
            "authorization",
            "deploy",
            "kubernetes",
            "docker",
            "algorithm",
            "concurrency",
            "async",
            "microservice",
            "architecture",
            "security",
            "encryption",
            "sql",
            "graphql",
            "websocket",
            "distributed",
            "cache",
            "index",
            "migration",
        ];
        let tech_hits = technical_keywords
            .iter()
            .filter(|kw| lower.contains(**kw))
            .count();
        let tech_score = (tech_hits as f32 / 4.0).min(1.0) * 0.25;

        // Component 4: Multi-step indicators.
        let step_indicators = [
            "first",
            "second",
            "third",
            "then",
            "finally",
            "next",
            "step 1",
            "step 2",
            "step 3",
            "after that",
            "followed by",
            "in addition",
        ];
        let step_hits = step_indicators
            .iter()
            .filter(|si| lower.contains(**si))
            .count();
        let step_score = (step_hits as f32 / 3.0).min(1.0) * 0.20;

        // Component 5: Code fence presence.
        let code_score = if lower.contains("```") { 0.15 } else { 0.0 };

        (length_score + sentence_score + tech_score + step_score + code_score).clamp(0.0, 1.0)
    }
}

impl Default for TaskComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
