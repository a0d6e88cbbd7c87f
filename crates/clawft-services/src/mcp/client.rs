//! Full MCP client features (F9b).
//!
//! Extends the core MCP client (F9a, in `mod.rs`) with:
//! - **Auto-discovery**: Find MCP servers from `~/.clawft/mcp/` config
//! - **Connection pooling**: Reuse sessions across tool calls
//! - **Schema caching**: Cache tool schemas with configurable TTL
//! - **Health checks**: Detect and reconnect failed servers
//! - **Per-agent MCP configuration**: Agent-level server overrides

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ToolDefinition;
use super::discovery::McpServerConfig;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the full MCP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpClientConfig {
    /// Directory to scan for MCP server configuration files.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// TTL for cached tool schemas (seconds).
    #[serde(default = "default_schema_ttl_secs")]
    pub schema_ttl_secs: u64,

    /// Interval between health checks (seconds).
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,

    /// Maximum connection pool size per server.
    #[serde(default = "default_max_connections")]
    pub max_connections_per_server: usize,

    /// Maximum number of reconnect attempts before marking server as failed.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clawft")
        .join("mcp")
}

fn default_schema_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_health_check_interval_secs() -> u64 {
    60
}

fn default_max_connections() -> usize {
    3
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            schema_ttl_secs: default_schema_ttl_secs(),
            health_check_interval_secs: default_health_check_interval_secs(),
            max_connections_per_server: default_max_connections(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-agent configuration
// ---------------------------------------------------------------------------

/// Per-agent MCP server configuration.
///
/// Agent-level entries with the same server name replace global entries.
/// New names are appended. `enabled = false` explicitly excludes a
/// global server for this agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMcpServerConfig {
    /// Server name (must match a global or define a new server).
    pub name: String,

    /// Whether this server is enabled for the agent.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Optional URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Optional command override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Optional args override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Schema cache
// ---------------------------------------------------------------------------

/// Cached tool schemas for a server with expiration.
#[derive(Debug, Clone)]
struct CachedSchemas {
    /// Tool definitions from the server.
    tools: Vec<ToolDefinition>,
    /// When the cache was populated.
    fetched_at: Instant,
    /// TTL for this cache entry.
    ttl: Duration,
}

impl CachedSchemas {
    fn new(tools: Vec<ToolDefinition>, ttl: Duration) -> Self {
        Self {
            tools,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.ttl
    }
}

// ---------------------------------------------------------------------------
// Connection pool entry
// ---------------------------------------------------------------------------

/// Health status of a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionHealth {
    /// Connection is healthy and responsive.
    Healthy,
    /// Connection is degraded (slow responses).
    Degraded,
    /// Connection has failed and needs reconnection.
    Failed,
    /// Connection has not been checked yet.
    Unknown,
}

/// A pooled server connection.
#[derive(Debug)]
struct PooledConnection {
    /// Server configuration (used when reconnecting).
    #[allow(dead_code)]
    config: McpServerConfig,
    /// Current health status.
    health: ConnectionHealth,
    /// Number of consecutive failures.
    failure_count: u32,
    /// When the last health check was performed.
    last_health_check: Option<Instant>,
    /// When the connection was established.
    #[allow(dead_code)]
    connected_at: Option<Instant>,
}

// ---------------------------------------------------------------------------
// McpClientPool
// ---------------------------------------------------------------------------

/// Full MCP client with connection pooling, schema caching, and health checks.
///
/// This is the F9b extension that builds on the F9a `McpClient` / `McpSession`.
/// It manages multiple MCP server connections, caches tool schemas, and
/// performs periodic health checks.
pub struct McpClientPool {
    config: McpClientConfig,
    /// Server connections keyed by server name.
    connections: Arc<RwLock<HashMap<String, PooledConnection>>>,
    /// Cached schemas keyed by server name.
    schema_cache: Arc<RwLock<HashMap<String, CachedSchemas>>>,
}

impl McpClientPool {
    /// Create a new MCP client pool with the given configuration.
    pub fn new(config: McpClientConfig) -> Self {
        Self {
            config,
            connections: Arc::new(RwLock::new(HashMap::new())),
            schema_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Auto-discover MCP servers from the config directory.
    ///
    /// Scans `~/.clawft/mcp/` for JSON or TOML config files, each
    /// defining one or more MCP server configurations.
    pub async fn auto_discover(&self) -> Vec<McpServerConfig> {
        let config_dir = &self.config.config_dir;
        let mut discovered = Vec::new();

        if !config_dir.is_dir() {
            debug!(path = %config_dir.display(), "MCP config directory not found");
            return discovered;
        }

        let entries = match std::fs::read_dir(config_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "failed to read MCP config directory"
                );
                return discovered;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

            if ext == "json" {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str::<Vec<McpServerConfig>>(&content) {
                        Ok(configs) => {
                            info!(
                                path = %path.display(),
                                count = configs.len(),
                                "discovered MCP servers"
                            );
                            discovered.extend(configs);
                        }
                        Err(_) => {
                            // Try single config
                            if let Ok(config) = serde_json::from_str::<McpServerConfig>(&content) {
                                info!(
                                    path = %path.display(),
                                    name = %config.name,
                                    "discovered MCP server"
                                );
                                discovered.push(config);
                            }
                        }
                    },
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to read MCP config file"
                        );
                    }
                }
            }
        }

        discovered
    }

    /// Apply per-agent overrides to the global server list.
    ///
    /// Agent-level entries with the same name replace globals.
    /// `enabled = false` removes the server from the agent's view.
    pub fn apply_agent_overrides(
        global: &[McpServerConfig],
        agent_overrides: &[AgentMcpServerConfig],
    ) -> Vec<McpServerConfig> {
        let override_map: HashMap<&str, &AgentMcpServerConfig> =
            agent_overrides.iter().map(|o| (o.name.as_str(), o)).collect();

        let mut result: Vec<McpServerConfig> = Vec::new();

        // Process global servers with overrides
        for server in global {
            if let Some(override_cfg) = override_map.get(server.name.as_str()) {
                if !override_cfg.enabled {
                    // Explicitly disabled for this agent
                    continue;
                }
                // Apply overrides
                let mut merged = server.clone();
                if let Some(ref url) = override_cfg.url {
                    merged.url = Some(url.clone());
                }
                if let Some(ref command) = override_cfg.command {
                    merged.command = command.clone();
                }
                if let Some(ref args) = override_cfg.args {
                    merged.args = args.clone();
                }
                result.push(merged);
            } else {
                result.push(server.clone());
            }
        }

        // Add agent-only servers (not in global list)
        let global_names: std::collections::HashSet<&str> =
            global.iter().map(|s| s.name.as_str()).collect();
        for override_cfg in agent_overrides {
            if !global_names.contains(override_cfg.name.as_str())
                && override_cfg.enabled
                && let Some(ref command) = override_cfg.command
            {
                result.push(McpServerConfig {
                    name: override_cfg.name.clone(),
                    command: command.clone(),
                    args: override_cfg.args.clone().unwrap_or_default(),
                    env: HashMap::new(),
                    url: override_cfg.url.clone(),
                });
            }
        }

        result
    }

    /// Register a server connection in the pool.
    pub async fn register_server(&self, config: McpServerConfig) {
        let name = config.name.clone();
        let conn = PooledConnection {
            config,
            health: ConnectionHealth::Unknown,
            failure_count: 0,
            last_health_check: None,
            connected_at: None,
        };
        let mut connections = self.connections.write().await;
        connections.insert(name.clone(), conn);
        debug!(name = %name, "registered MCP server in pool");
    }

    /// Get cached schemas for a server, returning `None` if expired or missing.
    pub async fn get_cached_schemas(&self, server_name: &str) -> Option<Vec<ToolDefinition>> {
        let cache = self.schema_cache.read().await;
        cache
            .get(server_name)
            .filter(|c| !c.is_expired())
            .map(|c| c.tools.clone())
    }

    /// Store schemas in the cache for a server.
    pub async fn cache_schemas(&self, server_name: &str, tools: Vec<ToolDefinition>) {
        let ttl = Duration::from_secs(self.config.schema_ttl_secs);
        let entry = CachedSchemas::new(tools, ttl);
        let mut cache = self.schema_cache.write().await;
        cache.insert(server_name.to_string(), entry);
        debug!(
            server = %server_name,
            ttl_secs = self.config.schema_ttl_secs,
            "cached tool schemas"
        );
    }

    /// Invalidate cached schemas for a server.
    pub async fn invalidate_cache(&self, server_name: &str) {
        let mut cache = self.schema_cache.write().await;
        cache.remove(server_name);
    }

    /// Update the health status of a server.
    pub async fn update_health(&self, server_name: &str, health: ConnectionHealth) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections.get_mut(server_name) {
            conn.health = health;
            conn.last_health_check = Some(Instant::now());
            if health == ConnectionHealth::Failed {
                conn.failure_count += 1;
            } else {
                conn.failure_count = 0;
            }
        }
    }

    /// Get the health status of a server.
    pub async fn get_health(&self, server_name: &str) -> Option<ConnectionHealth> {
        let connections = self.connections.read().await;
        connections.get(server_name).map(|c| c.health)
    }

    /// Check if a server should be reconnected (exceeded max failures).
    pub async fn needs_reconnect(&self, server_name: &str) -> bool {
        let connections = self.connections.read().await;
        connections
            .get(server_name)
            .is_some_and(|c| {
                c.health == ConnectionHealth::Failed
                    && c.failure_count < self.config.max_reconnect_attempts
            })
    }

    /// List all servers that need health checks.
    pub async fn servers_needing_health_check(&self) -> Vec<String> {
        let interval = Duration::from_secs(self.config.health_check_interval_secs);
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|(_, conn)| {
                conn.last_health_check
                    .is_none_or(|t| t.elapsed() > interval)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of pooled connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of cached schemas.
    pub async fn cache_size(&self) -> usize {
        self.schema_cache.read().await.len()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &McpClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for McpClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClientPool")
            .field("config_dir", &self.config.config_dir)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
