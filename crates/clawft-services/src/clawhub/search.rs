//! Skill search with vector search integration and keyword fallback.
//!
//! When the H2 vector store (from Element 08) is available, uses semantic
//! search via embeddings. Falls back to keyword-based search otherwise.

use serde::{Deserialize, Serialize};

use super::registry::SkillEntry;

/// Search result with relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSearchResult {
    /// The matched skill entry.
    pub skill: SkillEntry,
    /// Relevance score (0.0 to 1.0, higher is better).
    pub score: f32,
    /// Whether the match was via vector (semantic) or keyword search.
    pub match_type: MatchType,
}

/// How a search result was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Matched via vector/semantic search (HNSW).
    Vector,
    /// Matched via keyword/text search (fallback).
    Keyword,
}

/// Keyword-based search over skill entries.
///
/// Used as fallback when vector search (H2) is unavailable.
pub fn keyword_search(
    skills: &[SkillEntry],
    query: &str,
    limit: usize,
) -> Vec<SkillSearchResult> {
    let query_lower = query.to_lowercase();
    let query_terms: Vec<&str> = query_lower.split_whitespace().collect();

    let mut scored: Vec<(f32, &SkillEntry)> = skills
        .iter()
        .filter_map(|skill| {
            let score = compute_keyword_score(skill, &query_terms);
            if score > 0.0 {
                Some((score, skill))
            } else {
                None
            }
        })
        .collect();

    // Sort by score descending.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(limit)
        .map(|(score, skill)| SkillSearchResult {
            skill: skill.clone(),
            score,
            match_type: MatchType::Keyword,
        })
        .collect()
}

/// Compute a keyword relevance score for a skill entry.
fn compute_keyword_score(skill: &SkillEntry, query_terms: &[&str]) -> f32 {
    let mut score = 0.0_f32;
    let name_lower = skill.name.to_lowercase();
    let desc_lower = skill.description.to_lowercase();

    for term in query_terms {
        // Name matches are worth more.
        if name_lower.contains(term) {
            score += 2.0;
        }
        // Description matches.
        if desc_lower.contains(term) {
            score += 1.0;
        }
        // Tag matches.
        for tag in &skill.tags {
            if tag.to_lowercase().contains(term) {
                score += 1.5;
            }
        }
    }

    // Normalize to 0.0-1.0 range.
    let max_possible = query_terms.len() as f32 * 4.5; // max per term
    if max_possible > 0.0 {
        (score / max_possible).min(1.0)
    } else {
        0.0
    }
}
