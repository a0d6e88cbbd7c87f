//! In-memory vector store with cosine similarity search.
//!
//! Provides a simple [`VectorStore`] that holds embedding vectors alongside
//! their text, tags, and metadata. Search is brute-force cosine similarity
//! over all entries, returning top-k results sorted by descending score.
//!
//! This module is gated behind the `vector-memory` feature flag.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single entry in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// The original text that was embedded.
    pub text: String,
    /// The embedding vector.
    pub embedding: Vec<f32>,
    /// Tags for categorization and filtering.
    pub tags: Vec<String>,
    /// Arbitrary metadata.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Unix timestamp (seconds since epoch) when the entry was added.
    pub timestamp: u64,
}

/// A search result from the vector store.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The entry ID.
    pub id: String,
    /// The original text.
    pub text: String,
    /// Cosine similarity score (higher = more similar).
    pub score: f32,
    /// Tags from the entry.
    pub tags: Vec<String>,
    /// Timestamp from the entry.
    pub timestamp: u64,
}

/// In-memory vector store with brute-force cosine similarity search.
///
/// Suitable for small to medium datasets (up to tens of thousands of entries).
/// For larger datasets, swap to an HNSW-based backend (e.g. RVF) when available.
#[derive(Debug, Default)]
pub struct VectorStore {
    entries: Vec<VectorEntry>,
}

impl VectorStore {
    /// Create a new, empty vector store.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry to the store.
    pub fn add(
        &mut self,
        id: String,
        text: String,
        embedding: Vec<f32>,
        tags: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.entries.push(VectorEntry {
            id,
            text,
            embedding,
            tags,
            metadata,
            timestamp,
        });
    }

    /// Add an entry with an explicit timestamp.
    pub fn add_with_timestamp(
        &mut self,
        id: String,
        text: String,
        embedding: Vec<f32>,
        tags: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
        timestamp: u64,
    ) {
        self.entries.push(VectorEntry {
            id,
            text,
            embedding,
            tags,
            metadata,
            timestamp,
        });
    }

    /// Search for the top-k most similar entries to the query embedding.
    ///
    /// Results are sorted by descending cosine similarity score.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        if self.entries.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                SearchResult {
                    id: entry.id.clone(),
                    text: entry.text.clone(),
                    score,
                    tags: entry.tags.clone(),
                    timestamp: entry.timestamp,
                }
            })
            .collect();

        // Sort by descending score.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored.truncate(top_k);
        scored
    }

    /// Remove an entry by ID. Returns `true` if the entry was found and removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    /// Return the number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all entries (for serialization / inspection).
    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero norm.
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
