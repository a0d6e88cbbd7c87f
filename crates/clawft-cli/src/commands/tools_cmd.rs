//! `weft tools` -- CLI commands for tool discovery and management.
//!
//! Provides subcommands:
//!
//! - `weft tools list` -- list all registered tools with source annotation.
//! - `weft tools show <name>` -- show tool details and parameter schema.
//! - `weft tools mcp` -- list configured MCP servers and tool counts.
//! - `weft tools search <query>` -- search tools by name or description.
//! - `weft tools deny <pattern>` -- add a glob pattern to the tool denylist.
//! - `weft tools allow <pattern>` -- remove a pattern from the tool denylist.

use std::sync::Arc;

use clap::{Args, Subcommand};
use comfy_table::{Table, presets};

use clawft_core::tools::registry::ToolRegistry;
use clawft_types::config::Config;

/// Arguments for the `weft tools` subcommand.
#[derive(Args)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub action: ToolsAction,
}

/// Subcommands for `weft tools`.
#[derive(Subcommand)]
pub enum ToolsAction {
    /// List all registered tools with source annotation.
    List {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show details and parameter schema for a specific tool.
    Show {
        /// Tool name to inspect.
        name: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// List configured MCP servers and their tool counts.
    Mcp {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Search tools by name or description.
    Search {
        /// Search query (case-insensitive substring match).
        query: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Add a glob pattern to the tool denylist.
    Deny {
        /// Glob pattern (e.g. "exec_*", "claude-flow__browser_*").
        pattern: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Remove a pattern from the tool denylist.
    Allow {
        /// Exact pattern to remove from the denylist.
        pattern: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Run the tools subcommand.
pub async fn run(args: ToolsArgs) -> anyhow::Result<()> {
    match args.action {
        ToolsAction::List { config } => {
            let (cfg, platform) = load_platform_config(config.as_deref()).await?;
            let registry = build_registry(&cfg, platform).await;
            tools_list(&registry)
        }
        ToolsAction::Show { name, config } => {
            let (cfg, platform) = load_platform_config(config.as_deref()).await?;
            let registry = build_registry(&cfg, platform).await;
            tools_show(&name, &registry)
        }
        ToolsAction::Mcp { config } => {
            let (cfg, platform) = load_platform_config(config.as_deref()).await?;
            let registry = build_registry(&cfg, platform).await;
            tools_mcp(&cfg, &registry)
        }
        ToolsAction::Search { query, config } => {
            let (cfg, platform) = load_platform_config(config.as_deref()).await?;
            let registry = build_registry(&cfg, platform).await;
            tools_search(&query, &registry)
        }
        ToolsAction::Deny { pattern, config } => tools_deny(&pattern, config.as_deref()),
        ToolsAction::Allow { pattern, config } => tools_allow(&pattern, config.as_deref()),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Load config and create a NativePlatform.
async fn load_platform_config(
    config_override: Option<&str>,
) -> anyhow::Result<(Config, Arc<clawft_platform::NativePlatform>)> {
    let platform = Arc::new(clawft_platform::NativePlatform::new());
    let cfg = super::load_config(platform.as_ref(), config_override).await?;
    Ok((cfg, platform))
}

/// Build the full tool registry (same set as `weft agent` / `weft gateway`).
async fn build_registry(
    config: &Config,
    platform: Arc<clawft_platform::NativePlatform>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    super::register_core_tools(&mut registry, config, platform).await;
    registry
}

/// Classify a tool's source from its name.
///
/// - Contains `__` -> `mcp:{server}` (prefix before first `__`).
/// - Equals `delegate_task` -> `delegation`.
/// - Otherwise -> `builtin`.
fn classify_source(name: &str) -> String {
    if name == "delegate_task" {
        return "delegation".into();
    }
    if let Some((server, _)) = name.split_once("__") {
        return format!("mcp:{server}");
    }
    "builtin".into()
}

/// Truncate a string to `max_len` characters, appending "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Discover the config file path for write-back operations.
fn discover_config_file(config_override: Option<&str>) -> anyhow::Result<std::path::PathBuf> {
    if let Some(path) = config_override {
        return Ok(std::path::PathBuf::from(path));
    }
    let platform = clawft_platform::NativePlatform::new();
    super::discover_config_path(&platform).ok_or_else(|| {
        anyhow::anyhow!(
            "no config file found. Create one at ~/.clawft/config.json \
             or set CLAWFT_CONFIG, or pass --config."
        )
    })
}

// ── Subcommand implementations ──────────────────────────────────────────

/// List all registered tools.
fn tools_list(registry: &ToolRegistry) -> anyhow::Result<()> {
    let names = registry.list();

    if names.is_empty() {
        println!("No tools registered.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(["NAME", "SOURCE", "DESCRIPTION"]);

    for name in &names {
        let source = classify_source(name);
        let desc = registry
            .get(name)
            .map(|t| truncate(t.description(), 60))
            .unwrap_or_default();
        table.add_row([name.as_str(), &source, &desc]);
    }

    println!("{table}");
    println!();
    println!("Total: {} tool(s)", names.len());

    Ok(())
}

/// Show details and parameter schema for a specific tool.
fn tools_show(name: &str, registry: &ToolRegistry) -> anyhow::Result<()> {
    let tool = registry.get(name).ok_or_else(|| {
        anyhow::anyhow!("tool not found: {name}\nUse 'weft tools list' to see available tools.")
    })?;

    println!("Tool: {}", tool.name());
    println!("Source: {}", classify_source(name));
    println!("Description: {}", tool.description());

    // Show metadata if present.
    if let Some(meta) = registry.get_metadata(name) {
        println!("Permission level: {:?}", meta.required_permission_level);
        if !meta.required_custom_permissions.is_empty() {
            let keys: Vec<&str> = meta
                .required_custom_permissions
                .keys()
                .map(|k| k.as_str())
                .collect();
            println!("Custom permissions: {}", keys.join(", "));
        }
    }

    // Show parameters schema.
    let params = tool.parameters();
    println!();
    println!("Parameters:");
    match serde_json::to_string_pretty(&params) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("  (failed to serialize: {e})"),
    }

    Ok(())
}

/// List configured MCP servers with tool counts.
fn tools_mcp(config: &Config, registry: &ToolRegistry) -> anyhow::Result<()> {
    let servers = &config.tools.mcp_servers;

    if servers.is_empty() {
        println!("No MCP servers configured.");
        println!();
        println!("Add MCP servers in config.json under tools.mcp_servers.");
        return Ok(());
    }

    let names = registry.list();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(["SERVER", "TRANSPORT", "INTERNAL", "TOOLS"]);

    let mut sorted_servers: Vec<(&String, &clawft_types::config::MCPServerConfig)> =
        servers.iter().collect();
    sorted_servers.sort_by_key(|(k, _)| k.as_str());

    for (server_name, server_cfg) in &sorted_servers {
        let transport = if !server_cfg.url.is_empty() {
            "http"
        } else if !server_cfg.command.is_empty() {
            "stdio"
        } else {
            "unknown"
        };

        let internal = if server_cfg.internal_only {
            "yes"
        } else {
            "no"
        };

        let prefix = format!("{server_name}__");
        let tool_count = names.iter().filter(|n| n.starts_with(&prefix)).count();

        table.add_row([
            server_name.as_str(),
            transport,
            internal,
            &tool_count.to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("Total: {} MCP server(s)", sorted_servers.len());

    Ok(())
}

/// Search tools by name or description (case-insensitive).
fn tools_search(query: &str, registry: &ToolRegistry) -> anyhow::Result<()> {
    let names = registry.list();
    let query_lower = query.to_lowercase();

    let matches: Vec<&String> = names
        .iter()
        .filter(|name| {
            let name_match = name.to_lowercase().contains(&query_lower);
            let desc_match = registry
                .get(name)
                .map(|t| t.description().to_lowercase().contains(&query_lower))
                .unwrap_or(false);
            name_match || desc_match
        })
        .collect();

    if matches.is_empty() {
        println!("No tools matching '{query}'.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(["NAME", "SOURCE", "DESCRIPTION"]);

    for name in &matches {
        let source = classify_source(name);
        let desc = registry
            .get(name)
            .map(|t| truncate(t.description(), 60))
            .unwrap_or_default();
        table.add_row([name.as_str(), &source, &desc]);
    }

    println!("{table}");
    println!();
    println!(
        "Found: {} tool(s) matching '{query}'",
        matches.len()
    );

    Ok(())
}

/// Add a glob pattern to the admin tool denylist.
fn tools_deny(pattern: &str, config_override: Option<&str>) -> anyhow::Result<()> {
    let config_path = discover_config_file(config_override)?;

    let mut raw: serde_json::Value = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("failed to read config: {e}"))?;
        serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?
    } else {
        serde_json::json!({})
    };

    // Navigate to routing.permissions.admin.tool_denylist, creating as needed.
    let denylist = raw
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("config root is not an object"))?
        .entry("routing")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("routing is not an object"))?
        .entry("permissions")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("permissions is not an object"))?
        .entry("admin")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("admin is not an object"))?
        .entry("tool_denylist")
        .or_insert_with(|| serde_json::json!([]));

    let arr = denylist
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("tool_denylist is not an array"))?;

    // Check if pattern already exists.
    let pattern_val = serde_json::Value::String(pattern.to_string());
    if arr.contains(&pattern_val) {
        println!("Pattern '{pattern}' is already in the denylist.");
        return Ok(());
    }

    arr.push(pattern_val);

    let output = serde_json::to_string_pretty(&raw)?;
    std::fs::write(&config_path, output)
        .map_err(|e| anyhow::anyhow!("failed to write config: {e}"))?;

    println!("Added '{pattern}' to tool denylist.");
    println!("Config updated: {}", config_path.display());

    Ok(())
}

/// Remove a pattern from the admin tool denylist.
fn tools_allow(pattern: &str, config_override: Option<&str>) -> anyhow::Result<()> {
    let config_path = discover_config_file(config_override)?;

    if !config_path.exists() {
        anyhow::bail!(
            "config file not found: {}. Nothing to update.",
            config_path.display()
        );
    }

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to read config: {e}"))?;
    let mut raw: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

    // Navigate to routing.permissions.admin.tool_denylist.
    let denylist = raw
        .pointer_mut("/routing/permissions/admin/tool_denylist")
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no tool_denylist found in config. \
                 Use 'weft tools deny' to create one first."
            )
        })?;

    let arr = denylist
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("tool_denylist is not an array"))?;

    let pattern_val = serde_json::Value::String(pattern.to_string());
    let original_len = arr.len();
    arr.retain(|v| v != &pattern_val);

    if arr.len() == original_len {
        println!("Pattern '{pattern}' was not in the denylist.");
        return Ok(());
    }

    let output = serde_json::to_string_pretty(&raw)?;
    std::fs::write(&config_path, output)
        .map_err(|e| anyhow::anyhow!("failed to write config: {e}"))?;

    println!("Removed '{pattern}' from tool denylist.");
    println!("Config updated: {}", config_path.display());

    Ok(())
}
