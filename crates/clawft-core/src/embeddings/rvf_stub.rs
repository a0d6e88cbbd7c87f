//! Stub vector store with an RVF-compatible interface.
//!
//! Provides [`RvfStore`], an in-memory vector store that mirrors the API
//! shape of `rvf-runtime::RvfStore` (create, open, ingest, query, delete,
//! compact). This stub uses brute-force cosine similarity and serializes
//! to a JSON file for persistence.
//!
//! When the real `rvf-runtime` crate is integrated, this stub can be
//! replaced or wrapped while keeping the same interface.
//!
//! This module is gated behind the `rvf` feature flag.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from the RVF stub store.
#[derive(Debug)]
pub enum RvfError {
    /// An I/O error occurred (reading/writing the store file).
    Io(std::io::Error),
    /// A serialization/deserialization error occurred.
    Serde(serde_json::Error),
    /// The entry was not found.
    NotFound(String),
}

impl std::fmt::Display for RvfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RvfError::Io(e) => write!(f, "rvf I/O error: {e}"),
            RvfError::Serde(e) => write!(f, "rvf serde error: {e}"),
            RvfError::NotFound(id) => write!(f, "rvf entry not found: {id}"),
        }
    }
}

impl std::error::Error for RvfError {}

impl From<std::io::Error> for RvfError {
    fn from(e: std::io::Error) -> Self {
        RvfError::Io(e)
    }
}

impl From<serde_json::Error> for RvfError {
    fn from(e: serde_json::Error) -> Self {
        RvfError::Serde(e)
    }
}

/// A single entry in the RVF stub store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RvfEntry {
    /// Unique identifier.
    pub id: String,
    /// The embedding vector.
    pub embedding: Vec<f32>,
    /// Arbitrary metadata.
    pub metadata: serde_json::Value,
}

/// A query result from the store.
#[derive(Debug, Clone)]
pub struct RvfQueryResult {
    /// The entry ID.
    pub id: String,
    /// Cosine similarity score.
    pub score: f32,
    /// The entry metadata.
    pub metadata: serde_json::Value,
}

/// Serializable store state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreState {
    entries: Vec<RvfEntry>,
}

/// In-memory vector store with an RVF-compatible interface.
///
/// The store holds entries in a `Vec` and performs brute-force cosine
/// similarity for queries. It can be persisted to a JSON file via
/// [`compact`](RvfStore::compact) and reloaded via [`open`](RvfStore::open).
///
/// # Thread Safety
///
/// This store is NOT thread-safe. Wrap in a `Mutex` or `RwLock` if
/// concurrent access is needed.
pub struct RvfStore {
    entries: Vec<RvfEntry>,
    path: Option<PathBuf>,
}

impl RvfStore {
    /// Create a new, empty in-memory store with an optional file path.
    ///
    /// If `path` is provided, [`compact`](RvfStore::compact) will persist
    /// the store to that file.
    pub fn create(path: Option<&Path>) -> Self {
        debug!(path = ?path, "creating new RvfStore");
        Self {
            entries: Vec::new(),
            path: path.map(|p| p.to_path_buf()),
        }
    }

    /// Open an existing store from a JSON file.
    ///
    /// If the file does not exist, creates a new empty store at that path.
    pub fn open(path: &Path) -> Result<Self, RvfError> {
        if path.exists() {
            debug!(path = %path.display(), "opening existing RvfStore");
            let data = std::fs::read_to_string(path)?;
            let state: StoreState = serde_json::from_str(&data)?;
            Ok(Self {
                entries: state.entries,
                path: Some(path.to_path_buf()),
            })
        } else {
            debug!(path = %path.display(), "no existing store, creating new");
            Ok(Self::create(Some(path)))
        }
    }

    /// Ingest (add) an entry into the store.
    pub fn ingest(&mut self, id: String, embedding: Vec<f32>, metadata: serde_json::Value) {
        // Remove existing entry with same ID (upsert semantics)
        self.entries.retain(|e| e.id != id);
        self.entries.push(RvfEntry {
            id,
            embedding,
            metadata,
        });
    }

    /// Query the store for the top-k most similar entries.
    ///
    /// Returns results sorted by descending cosine similarity.
    pub fn query(&self, query_embedding: &[f32], top_k: usize) -> Vec<RvfQueryResult> {
        if self.entries.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<RvfQueryResult> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                RvfQueryResult {
                    id: entry.id.clone(),
                    score,
                    metadata: entry.metadata.clone(),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        scored
    }

    /// Delete an entry by ID. Returns `true` if an entry was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    /// Persist the store to its file path (if set).
    ///
    /// This is analogous to RVF compaction -- in the stub, it simply
    /// serializes all entries to JSON.
    pub fn compact(&self) -> Result<(), RvfError> {
        let Some(ref path) = self.path else {
            return Ok(()); // no path, nothing to persist
        };

        debug!(path = %path.display(), entries = self.entries.len(), "compacting RvfStore");

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let state = StoreState {
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Return the number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the file path (if set).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get an entry by ID.
    pub fn get(&self, id: &str) -> Option<&RvfEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Compute cosine similarity between two vectors.
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
