//! Document retrieval contract used by the `docsearch` tool class.
//!
//! Deliberately thin: concrete indexing (what gets embedded, where it is
//! stored) is out of scope for the dispatch engine. Grounded on
//! [`crate::embeddings::Embedder`] and [`crate::vector_store::VectorStore`]
//! for the dense-similarity half of the contract; `score` is a blend of
//! dense similarity and lexical overlap so a caller can combine both
//! without the trait dictating how.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One retrieved passage, with the score that ranked it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Errors a `Retriever` implementation can surface. Mirrors
/// [`crate::embeddings::EmbeddingError`]'s split between bad input and an
/// internal backend failure.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

/// A source of passages for the `docsearch` tool class. No concrete
/// implementation ships here; `ErrorRecovery`'s `"docsearch"` policy
/// (1 retry, short fallback text) assumes whatever backend is wired in
/// can fail like any other external tool.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `top_k` passages relevant to `query`, highest score
    /// first. A blend of dense similarity and lexical overlap is the
    /// expected scoring approach, but the exact blend weight is left to
    /// the implementation.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedPassage>, RetrieverError>;
}
