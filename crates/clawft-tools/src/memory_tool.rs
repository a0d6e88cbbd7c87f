//! Memory read/write tools.
//!
//! Two tools that read from and write to a workspace-level MEMORY.md file.
//! The memory file lives at `~/.clawft/workspace/memory/MEMORY.md` (with
//! fallback to `~/.nanobot/workspace/memory/MEMORY.md`).
//!
//! When the `vector-memory` feature is enabled, search queries use the
//! [`VectorStore`](clawft_core::vector_store::VectorStore) with
//! [`HashEmbedder`](clawft_core::embeddings::hash_embedder::HashEmbedder)
//! for semantic similarity ranking. Otherwise, a simple substring paragraph
//! match is used as a fallback.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clawft_core::tools::registry::{Tool, ToolError};
use clawft_platform::Platform;
use serde_json::json;
use tracing::debug;

/// Relative path from home dir to the memory file.
const MEMORY_REL_PATH: &str = ".clawft/workspace/memory/MEMORY.md";

/// Fallback relative path (nanobot compatibility).
const MEMORY_FALLBACK_REL_PATH: &str = ".nanobot/workspace/memory/MEMORY.md";

/// Resolve the memory file path using the platform's home directory.
///
/// Tries `~/.clawft/workspace/memory/MEMORY.md` first, then falls back
/// to `~/.nanobot/workspace/memory/MEMORY.md`.
async fn resolve_memory_path<P: Platform>(platform: &P) -> Result<PathBuf, ToolError> {
    let home = platform
        .fs()
        .home_dir()
        .ok_or_else(|| ToolError::ExecutionFailed("unable to determine home directory".into()))?;

    let primary = home.join(MEMORY_REL_PATH);
    if platform.fs().exists(&primary).await {
        return Ok(primary);
    }

    let fallback = home.join(MEMORY_FALLBACK_REL_PATH);
    if platform.fs().exists(&fallback).await {
        return Ok(fallback);
    }

    // Default to primary path (will be created on write).
    Ok(primary)
}

/// Simple paragraph-level search within memory content.
///
/// Splits the content into paragraphs (separated by blank lines) and returns
/// those that contain the query string (case-insensitive).
fn search_paragraphs(content: &str, query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    content
        .split("\n\n")
        .filter(|paragraph| paragraph.to_lowercase().contains(&query_lower))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Vector-based semantic search over paragraphs using cosine similarity.
///
/// When the `vector-memory` feature is enabled, this function:
/// 1. Splits content into paragraphs.
/// 2. Embeds each paragraph using the `HashEmbedder`.
/// 3. Embeds the query.
/// 4. Performs cosine similarity search via `VectorStore`.
/// 5. Returns paragraphs ranked by similarity score.
///
/// Falls back to `search_paragraphs` if embedding fails.
#[cfg(feature = "vector-memory")]
fn search_paragraphs_vector(content: &str, query: &str, max_results: usize) -> Vec<String> {
    use clawft_core::embeddings::hash_embedder::HashEmbedder;
    use clawft_core::vector_store::VectorStore;
    use std::collections::HashMap;

    let paragraphs: Vec<&str> = content
        .split("\n\n")
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() || query.is_empty() {
        return Vec::new();
    }

    let embedder = HashEmbedder::default_dimension();
    let mut store = VectorStore::new();

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let embedding = embedder.compute_embedding(paragraph);
        store.add(
            format!("p{i}"),
            paragraph.to_string(),
            embedding,
            vec![],
            HashMap::new(),
        );
    }

    let query_embedding = embedder.compute_embedding(query);
    let results = store.search(&query_embedding, max_results);

    results.into_iter().map(|r| r.text).collect()
}

// ---------------------------------------------------------------------------
// MemoryReadTool
// ---------------------------------------------------------------------------

/// Read from the workspace memory file.
///
/// If a `query` is provided, returns matching paragraphs. Otherwise returns
/// the full content of `MEMORY.md`.
pub struct MemoryReadTool<P: Platform> {
    platform: Arc<P>,
}

impl<P: Platform> MemoryReadTool<P> {
    /// Create a new `MemoryReadTool`.
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl<P: Platform + 'static> Tool for MemoryReadTool<P> {
    fn name(&self) -> &str {
        "memory_read"
    }

    fn description(&self) -> &str {
        "Read from the workspace memory file. Optionally filter by a search query."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Optional search query to filter memory content"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let memory_path = resolve_memory_path(self.platform.as_ref()).await?;

        debug!(path = %memory_path.display(), "reading memory");

        if !self.platform.fs().exists(&memory_path).await {
            return Ok(json!({
                "content": "",
                "message": "No memory file found"
            }));
        }

        let content = self
            .platform
            .fs()
            .read_to_string(&memory_path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to read memory: {}", e)))?;

        let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");

        if query.is_empty() {
            Ok(json!({ "content": content }))
        } else {
            #[cfg(feature = "vector-memory")]
            let matches = search_paragraphs_vector(&content, query, 20);

            #[cfg(not(feature = "vector-memory"))]
            let matches = search_paragraphs(&content, query);

            Ok(json!({
                "query": query,
                "matches": matches,
                "count": matches.len(),
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryWriteTool
// ---------------------------------------------------------------------------

/// Write to the workspace memory file.
///
/// Supports `append` (default) and `overwrite` modes. Creates the file
/// and parent directories if they do not exist.
pub struct MemoryWriteTool<P: Platform> {
    platform: Arc<P>,
}

impl<P: Platform> MemoryWriteTool<P> {
    /// Create a new `MemoryWriteTool`.
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl<P: Platform + 'static> Tool for MemoryWriteTool<P> {
    fn name(&self) -> &str {
        "memory_write"
    }

    fn description(&self) -> &str {
        "Write to the workspace memory file. Supports append and overwrite modes."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The content to write to memory"
                },
                "mode": {
                    "type": "string",
                    "description": "Write mode: 'append' (default) or 'overwrite'",
                    "enum": ["append", "overwrite"]
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArgs("missing required field: content".to_string()))?;

        let mode = args
            .get("mode")
            .and_then(|v| v.as_str())
            .unwrap_or("append");

        let memory_path = resolve_memory_path(self.platform.as_ref()).await?;

        debug!(path = %memory_path.display(), mode, "writing memory");

        match mode {
            "overwrite" => {
                self.platform
                    .fs()
                    .write_string(&memory_path, content)
                    .await
                    .map_err(|e| {
                        ToolError::ExecutionFailed(format!("failed to write memory: {}", e))
                    })?;
            }
            _ => {
                // Prepend a newline separator if the file already has content.
                let separator = if self.platform.fs().exists(&memory_path).await {
                    "\n\n"
                } else {
                    ""
                };

                let to_write = format!("{}{}", separator, content);
                self.platform
                    .fs()
                    .append_string(&memory_path, &to_write)
                    .await
                    .map_err(|e| {
                        ToolError::ExecutionFailed(format!("failed to append memory: {}", e))
                    })?;
            }
        }

        Ok(json!({
            "message": format!("Successfully wrote {} bytes to memory (mode: {})", content.len(), mode),
            "path": memory_path.to_string_lossy(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
