//! Keyword classifier (Level 0 implementation).
//!
//! Classifies incoming chat requests by scanning the last user message
//! for keyword patterns. This is the simplest possible classifier -- no
//! ML, no embeddings, just case-insensitive substring matching.
//!
//! Keyword groups are checked in priority order; the first match wins.
//! If no keywords match, the task defaults to [`TaskType::Chat`].

use super::traits::{ChatRequest, TaskClassifier, TaskProfile, TaskType};

/// A keyword pattern entry: a list of keywords and the task type they map to.
struct KeywordPattern {
    keywords: &'static [&'static str],
    task_type: TaskType,
}

/// Static keyword patterns checked in priority order (first match wins).
///
/// Code-related patterns are checked before analysis because keywords like
/// "fix" and "debug" are more specific than "explain" or "summarize".
const PATTERNS: &[KeywordPattern] = &[
    // Code generation (most specific -- check first)
    KeywordPattern {
        keywords: &[
            "code",
            "function",
            "implement",
            "debug",
            "fix",
            "program",
            "script",
            "compile",
            "refactor",
            "class",
            "struct",
            "module",
        ],
        task_type: TaskType::CodeGeneration,
    },
    // Code review
    KeywordPattern {
        keywords: &["review", "check", "audit", "lint", "inspect"],
        task_type: TaskType::CodeReview,
    },
    // Research
    KeywordPattern {
        keywords: &[
            "search", "find", "research", "look up", "lookup", "discover",
        ],
        task_type: TaskType::Research,
    },
    // Creative
    KeywordPattern {
        keywords: &[
            "write",
            "story",
            "poem",
            "creative",
            "compose",
            "draft",
            "narrative",
        ],
        task_type: TaskType::Creative,
    },
    // Analysis
    KeywordPattern {
        keywords: &[
            "analyze",
            "explain",
            "summarize",
            "compare",
            "evaluate",
            "assess",
        ],
        task_type: TaskType::Analysis,
    },
    // Tool use
    KeywordPattern {
        keywords: &["use tool", "run tool", "execute", "call function"],
        task_type: TaskType::ToolUse,
    },
];

/// Level 0 keyword-based task classifier.
///
/// Scans the last user message for known keyword patterns and returns
/// a [`TaskProfile`] with the detected type, estimated complexity, and
/// matched keywords.
///
/// # Complexity heuristic
///
/// Complexity is estimated as the ratio of matched keywords to total words
/// in the message, clamped to \[0.1, 0.9\]. More keyword hits = higher
/// estimated complexity (the request is touching multiple concerns).
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Create a new keyword classifier.
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskClassifier for KeywordClassifier {
    fn classify(&self, request: &ChatRequest) -> TaskProfile {
        // Extract the last user message content, lowercased.
        let text = last_user_message(request);
        let text_lower = text.to_lowercase();

        // Scan patterns in priority order.
        let mut matched_type = TaskType::Chat;
        let mut matched_keywords: Vec<String> = Vec::new();

        for pattern in PATTERNS {
            let hits: Vec<String> = pattern
                .keywords
                .iter()
                .filter(|kw| text_lower.contains(**kw))
                .map(|kw| (*kw).to_string())
                .collect();

            if !hits.is_empty() && matched_keywords.is_empty() {
                // First matching pattern determines the type.
                matched_type = pattern.task_type.clone();
                matched_keywords = hits;
            } else if !hits.is_empty() {
                // Additional matches from later patterns still count for complexity.
                matched_keywords.extend(hits);
            }
        }

        // Estimate complexity from keyword density.
        let word_count = text_lower.split_whitespace().count().max(1) as f32;
        let keyword_density = matched_keywords.len() as f32 / word_count;
        let complexity = keyword_density.clamp(0.1, 0.9);

        TaskProfile {
            task_type: matched_type,
            complexity,
            keywords: matched_keywords,
        }
    }
}

/// Extract the content of the last user message, or empty string if none.
fn last_user_message(request: &ChatRequest) -> String {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
        .unwrap_or_default()
}
