//! RVF (RuVector Format) tool provider for MCP.
//!
//! Exposes RVF vector operations as MCP tools via the [`ToolProvider`] trait.
//! This module is gated behind the `rvf` feature flag.
//!
//! Currently uses in-memory stub stores that implement the same argument
//! parsing and validation as the real RVF backend. When `rvf-runtime` and
//! friends are available, the stub operations will be replaced by calls
//! into the real vector engine.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::ToolDefinition;
use crate::mcp::provider::{CallToolResult, ToolError, ToolProvider};

// ---------------------------------------------------------------------------
// Stub vector store
// ---------------------------------------------------------------------------

/// A single vector entry held in the stub store.
#[derive(Debug, Clone)]
struct StubEntry {
    id: String,
    embedding: Vec<f32>,
    metadata: HashMap<String, Value>,
}

/// In-memory stub vector store, standing in for a real RVF-backed store.
///
/// Supports insert, delete, brute-force query, and basic status reporting.
#[derive(Debug)]
struct StubVectorStore {
    dimension: usize,
    entries: Vec<StubEntry>,
}

impl StubVectorStore {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    fn ingest(&mut self, id: String, embedding: Vec<f32>, metadata: HashMap<String, Value>) {
        // Overwrite if same id exists.
        self.entries.retain(|e| e.id != id);
        self.entries.push(StubEntry {
            id,
            embedding,
            metadata,
        });
    }

    fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    fn delete_filter(&mut self, key: &str, value: &Value) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.metadata.get(key) != Some(value));
        before - self.entries.len()
    }

    fn query(&self, embedding: &[f32], top_k: usize) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = self
            .entries
            .iter()
            .map(|e| {
                let score = cosine_similarity(embedding, &e.embedding);
                (e.id.clone(), score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn compact(&mut self) {
        // No-op for stub -- real RVF would reclaim freed segments.
    }
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

// ---------------------------------------------------------------------------
// RvfToolProvider
// ---------------------------------------------------------------------------

/// Exposes RVF vector operations as MCP tools.
///
/// Manages a set of named vector stores and routes tool calls to the
/// appropriate operations: create, open, ingest, query, delete, compact,
/// status, list, route, and witness.
pub struct RvfToolProvider {
    stores: Mutex<HashMap<String, StubVectorStore>>,
    /// Audit trail for the `witness` tool.
    witness_log: Mutex<Vec<Value>>,
}

impl RvfToolProvider {
    /// Create a new RVF tool provider with no open stores.
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            witness_log: Mutex::new(Vec::new()),
        }
    }
}

impl Default for RvfToolProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RvfToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store_count = self.stores.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("RvfToolProvider")
            .field("store_count", &store_count)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ToolProvider impl
// ---------------------------------------------------------------------------

#[async_trait]
impl ToolProvider for RvfToolProvider {
    fn namespace(&self) -> &str {
        "rvf"
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![
            tool_def(
                "create_store",
                "Create a new vector store",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Store name" },
                        "dimension": { "type": "integer", "description": "Embedding dimension" }
                    },
                    "required": ["name", "dimension"]
                }),
            ),
            tool_def(
                "open_store",
                "Open an existing vector store",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Store name" }
                    },
                    "required": ["name"]
                }),
            ),
            tool_def(
                "ingest",
                "Add vectors to a store",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" },
                        "id": { "type": "string", "description": "Vector entry ID" },
                        "embedding": {
                            "type": "array",
                            "items": { "type": "number" },
                            "description": "Embedding vector"
                        },
                        "metadata": {
                            "type": "object",
                            "description": "Optional metadata key-value pairs"
                        }
                    },
                    "required": ["store", "id", "embedding"]
                }),
            ),
            tool_def(
                "query",
                "Search a store by embedding vector",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" },
                        "embedding": {
                            "type": "array",
                            "items": { "type": "number" },
                            "description": "Query embedding vector"
                        },
                        "top_k": {
                            "type": "integer",
                            "description": "Number of results to return",
                            "default": 10
                        }
                    },
                    "required": ["store", "embedding"]
                }),
            ),
            tool_def(
                "status",
                "Get store metrics and status",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" }
                    },
                    "required": ["store"]
                }),
            ),
            tool_def(
                "delete",
                "Remove a vector by ID",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" },
                        "id": { "type": "string", "description": "Vector entry ID to delete" }
                    },
                    "required": ["store", "id"]
                }),
            ),
            tool_def(
                "compact",
                "Reclaim space in a store",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" }
                    },
                    "required": ["store"]
                }),
            ),
            tool_def(
                "delete_filter",
                "Delete vectors matching a metadata filter",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "store": { "type": "string", "description": "Store name" },
                        "key": { "type": "string", "description": "Metadata key to filter on" },
                        "value": { "description": "Value to match for deletion" }
                    },
                    "required": ["store", "key", "value"]
                }),
            ),
            tool_def(
                "list_stores",
                "List all open vector stores",
                serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
            ),
            tool_def(
                "route",
                "Route a request to the optimal model tier",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "task_description": {
                            "type": "string",
                            "description": "Description of the task to route"
                        },
                        "complexity_hint": {
                            "type": "number",
                            "description": "Optional complexity score (0.0-1.0)"
                        }
                    },
                    "required": ["task_description"]
                }),
            ),
            tool_def(
                "witness",
                "Record an audit trail entry",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "action": { "type": "string", "description": "Action that was performed" },
                        "agent": { "type": "string", "description": "Agent that performed the action" },
                        "details": { "type": "object", "description": "Additional details" }
                    },
                    "required": ["action", "agent"]
                }),
            ),
        ]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, ToolError> {
        match name {
            "create_store" => self.handle_create_store(args),
            "open_store" => self.handle_open_store(args),
            "ingest" => self.handle_ingest(args),
            "query" => self.handle_query(args),
            "status" => self.handle_status(args),
            "delete" => self.handle_delete(args),
            "compact" => self.handle_compact(args),
            "delete_filter" => self.handle_delete_filter(args),
            "list_stores" => self.handle_list_stores(),
            "route" => self.handle_route(args),
            "witness" => self.handle_witness(args),
            _ => Err(ToolError::NotFound(name.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool handler implementations
// ---------------------------------------------------------------------------

impl RvfToolProvider {
    fn handle_create_store(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let name = require_str(&args, "name")?;
        let dimension = require_u64(&args, "dimension")? as usize;

        if dimension == 0 {
            return Ok(CallToolResult::error("dimension must be > 0"));
        }

        let mut stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        if stores.contains_key(&name) {
            return Ok(CallToolResult::error(format!(
                "store \"{name}\" already exists"
            )));
        }

        stores.insert(name.clone(), StubVectorStore::new(dimension));

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": name,
                "dimension": dimension,
                "status": "created"
            })
            .to_string(),
        ))
    }

    fn handle_open_store(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let name = require_str(&args, "name")?;

        let stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        if stores.contains_key(&name) {
            Ok(CallToolResult::text(
                serde_json::json!({
                    "store": name,
                    "status": "open",
                    "entries": stores[&name].len()
                })
                .to_string(),
            ))
        } else {
            Ok(CallToolResult::error(format!("store \"{name}\" not found")))
        }
    }

    fn handle_ingest(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;
        let id = require_str(&args, "id")?;
        let embedding = require_f32_array(&args, "embedding")?;

        let metadata: HashMap<String, Value> = args
            .get("metadata")
            .and_then(|v| v.as_object())
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let mut stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get_mut(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        if embedding.len() != store.dimension {
            return Ok(CallToolResult::error(format!(
                "dimension mismatch: expected {}, got {}",
                store.dimension,
                embedding.len()
            )));
        }

        store.ingest(id.clone(), embedding, metadata);

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "id": id,
                "status": "ingested",
                "total_entries": store.len()
            })
            .to_string(),
        ))
    }

    fn handle_query(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;
        let embedding = require_f32_array(&args, "embedding")?;
        let top_k = args.get("top_k").and_then(|v| v.as_u64()).unwrap_or(10) as usize;

        let stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        if embedding.len() != store.dimension {
            return Ok(CallToolResult::error(format!(
                "dimension mismatch: expected {}, got {}",
                store.dimension,
                embedding.len()
            )));
        }

        let results = store.query(&embedding, top_k);
        let results_json: Vec<Value> = results
            .into_iter()
            .map(|(id, score)| {
                serde_json::json!({
                    "id": id,
                    "score": score
                })
            })
            .collect();

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "results": results_json,
                "count": results_json.len()
            })
            .to_string(),
        ))
    }

    fn handle_status(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;

        let stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "entries": store.len(),
                "dimension": store.dimension,
                "index_type": "brute_force_stub",
                "backend": "in_memory"
            })
            .to_string(),
        ))
    }

    fn handle_delete(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;
        let id = require_str(&args, "id")?;

        let mut stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get_mut(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        let deleted = store.delete(&id);

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "id": id,
                "deleted": deleted,
                "remaining_entries": store.len()
            })
            .to_string(),
        ))
    }

    fn handle_compact(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;

        let mut stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get_mut(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        store.compact();

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "status": "compacted"
            })
            .to_string(),
        ))
    }

    fn handle_delete_filter(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let store_name = require_str(&args, "store")?;
        let key = require_str(&args, "key")?;
        let value = args
            .get("value")
            .cloned()
            .ok_or_else(|| ToolError::ExecutionFailed("missing required field: value".into()))?;

        let mut stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store = stores.get_mut(&store_name).ok_or_else(|| {
            ToolError::ExecutionFailed(format!("store \"{store_name}\" not found"))
        })?;

        let removed = store.delete_filter(&key, &value);

        Ok(CallToolResult::text(
            serde_json::json!({
                "store": store_name,
                "filter_key": key,
                "removed_count": removed,
                "remaining_entries": store.len()
            })
            .to_string(),
        ))
    }

    fn handle_list_stores(&self) -> Result<CallToolResult, ToolError> {
        let stores = self
            .stores
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        let store_list: Vec<Value> = stores
            .iter()
            .map(|(name, store)| {
                serde_json::json!({
                    "name": name,
                    "entries": store.len(),
                    "dimension": store.dimension
                })
            })
            .collect();

        Ok(CallToolResult::text(
            serde_json::json!({
                "stores": store_list,
                "count": store_list.len()
            })
            .to_string(),
        ))
    }

    fn handle_route(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let task_description = require_str(&args, "task_description")?;
        let complexity_hint = args
            .get("complexity_hint")
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| estimate_complexity(&task_description));

        // Stub routing logic: route based on complexity score.
        let (tier, model) = if complexity_hint < 0.3 {
            (1, "haiku")
        } else if complexity_hint < 0.7 {
            (2, "sonnet")
        } else {
            (3, "opus")
        };

        Ok(CallToolResult::text(
            serde_json::json!({
                "task": task_description,
                "complexity": complexity_hint,
                "tier": tier,
                "recommended_model": model,
                "routing_method": "stub_complexity_threshold"
            })
            .to_string(),
        ))
    }

    fn handle_witness(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let action = require_str(&args, "action")?;
        let agent = require_str(&args, "agent")?;
        let details = args.get("details").cloned().unwrap_or(Value::Null);

        let entry = serde_json::json!({
            "action": action,
            "agent": agent,
            "details": details,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        let mut log = self
            .witness_log
            .lock()
            .map_err(|e| ToolError::ExecutionFailed(format!("lock poisoned: {e}")))?;

        log.push(entry.clone());
        let sequence = log.len();

        Ok(CallToolResult::text(
            serde_json::json!({
                "status": "recorded",
                "sequence": sequence,
                "entry": entry
            })
            .to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a [`ToolDefinition`] from parts.
fn tool_def(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Extract a required string field from JSON args.
fn require_str(args: &Value, field: &str) -> Result<String, ToolError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ToolError::ExecutionFailed(format!("missing or invalid required field: {field}"))
        })
}

/// Extract a required u64 field from JSON args.
fn require_u64(args: &Value, field: &str) -> Result<u64, ToolError> {
    args.get(field).and_then(|v| v.as_u64()).ok_or_else(|| {
        ToolError::ExecutionFailed(format!("missing or invalid required field: {field}"))
    })
}

/// Extract a required array of f32 from JSON args.
fn require_f32_array(args: &Value, field: &str) -> Result<Vec<f32>, ToolError> {
    let arr = args.get(field).and_then(|v| v.as_array()).ok_or_else(|| {
        ToolError::ExecutionFailed(format!("missing or invalid required field: {field}"))
    })?;

    arr.iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                ToolError::ExecutionFailed(format!("non-numeric value in {field} array"))
            })
        })
        .collect()
}

/// Stub complexity estimator based on task description length and keywords.
fn estimate_complexity(description: &str) -> f64 {
    let word_count = description.split_whitespace().count();
    let has_complex_keywords = ["architecture", "security", "refactor", "migrate", "design"]
        .iter()
        .any(|kw| description.to_lowercase().contains(kw));

    let base = (word_count as f64 / 50.0).min(0.5);
    if has_complex_keywords {
        (base + 0.4).min(1.0)
    } else {
        base
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
