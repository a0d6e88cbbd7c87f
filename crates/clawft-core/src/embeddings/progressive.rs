//! Progressive search with three-tier recall strategy.
//!
//! Provides a [`ProgressiveSearch`] index that (in its final form) routes
//! through three layers:
//!
//! - **Layer A** -- Coarse routing (~70 % recall, microseconds)
//! - **Layer B** -- Hot-region refinement (~85 % recall)
//! - **Layer C** -- Full graph traversal (~95 % recall)
//!
//! The current implementation is a brute-force cosine similarity search that
//! serves as a drop-in stub. When the `rvf-index` crate becomes available the
//! internals will be swapped for a real HNSW graph while keeping this public
//! API stable.
//!
//! This module is gated behind the `rvf` feature flag.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────────

/// A single search result returned by [`ProgressiveSearch::search`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Identifier of the matched entry.
    pub id: String,
    /// Cosine similarity score (higher is better).
    pub score: f32,
    /// Arbitrary metadata attached to the entry.
    pub metadata: serde_json::Value,
}

/// Serializable representation of one entry (used for persistence).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    id: String,
    embedding: Vec<f32>,
    metadata: serde_json::Value,
}

// ── ProgressiveSearch ──────────────────────────────────────────────────

/// Three-tier progressive search index.
///
/// See the [module-level documentation](self) for tier descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressiveSearch {
    entries: Vec<Entry>,
}

impl ProgressiveSearch {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert an entry into the index.
    pub fn insert(&mut self, id: &str, embedding: Vec<f32>, metadata: serde_json::Value) {
        self.entries.push(Entry {
            id: id.to_owned(),
            embedding,
            metadata,
        });
    }

    /// Search for the `k` nearest entries to `query`.
    ///
    /// Returns results sorted by descending cosine similarity.
    ///
    /// # Stub behaviour
    ///
    /// The current implementation performs brute-force cosine similarity over
    /// all entries. This will be replaced by a real HNSW graph when
    /// `rvf-index` is available.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchResult> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                id: entry.id.clone(),
                score: cosine_similarity(query, &entry.embedding),
                metadata: entry.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored.truncate(k);
        scored
    }

    /// Return the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when the index contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the index to `path` as JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string(self).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("serialize failed: {e}"))
        })?;
        std::fs::write(path, json)
    }

    /// Load a previously saved index from `path`.
    pub fn load(path: &Path) -> io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("deserialize failed: {e}"),
            )
        })
    }
}

impl Default for ProgressiveSearch {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Compute cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has zero norm or when lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

// ── Tests ──────────────────────────────────────────────────────────────
