//! `weft` -- CLI binary for the clawft AI assistant framework.
//!
//! Provides the following subcommands:
//!
//! - `weft agent` -- Start an interactive agent session or send a single message.
//! - `weft gateway` -- Start channels + agent loop (Telegram, Slack, etc.).
//! - `weft mcp-server` -- Run as an MCP tool server over stdio.
//! - `weft status` -- Show configuration status and diagnostics.
//! - `weft channels` -- Inspect channel configuration status.
//! - `weft cron` -- Manage scheduled (cron) jobs.

use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod completions;
mod help_text;
pub mod interactive;
mod markdown;
mod mcp_tools;

/// clawft AI assistant CLI.
#[derive(Parser)]
#[command(
    name = "weft",
    about = "clawft AI assistant CLI",
    version,
    disable_help_subcommand = true
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Start an interactive agent session or send a single message.
    Agent(commands::agent::AgentArgs),

    /// Start the gateway (channels + agent loop).
    Gateway(commands::gateway::GatewayArgs),

    /// Run as an MCP tool server over stdio.
    #[cfg(feature = "services")]
    McpServer(commands::mcp_server::McpServerArgs),

    /// Show configuration status.
    Status(commands::status::StatusArgs),

    /// Inspect channel configuration.
    Channels {
        #[command(subcommand)]
        action: ChannelsAction,
    },

    /// Manage scheduled (cron) jobs.
    Cron {
        #[command(subcommand)]
        action: CronAction,
    },

    /// Manage agent sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsCmd,
    },

    /// Read and search agent memory.
    Memory {
        #[command(subcommand)]
        action: MemoryCmd,
    },

    /// Show resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },

    /// Manage skills (list, show, install).
    Skills(commands::skills_cmd::SkillsArgs),

    /// Manage agents (list, show, use).
    Agents(commands::agents_cmd::AgentsArgs),

    /// Manage workspaces.
    Workspace(commands::workspace_cmd::WorkspaceArgs),

    /// Initialize clawft config and workspace.
    Onboard(commands::onboard::OnboardArgs),

    /// Security scanning, auditing, and hardening.
    Security(commands::security_cmd::SecurityArgs),

    /// Show help for a topic (skills, agents, tools, commands, config).
    Help(commands::help_cmd::HelpArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate for (bash, zsh, fish, powershell).
        shell: String,
    },
}

/// Subcommands for `weft sessions`.
#[derive(Subcommand)]
enum SessionsCmd {
    /// List all sessions.
    List {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Inspect a specific session.
    Inspect {
        /// Session key to inspect.
        session_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Delete a specific session.
    Delete {
        /// Session key to delete.
        session_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `weft memory`.
#[derive(Subcommand)]
enum MemoryCmd {
    /// Display long-term memory (MEMORY.md).
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Display session history (HISTORY.md).
    History {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Search memory and history.
    Search {
        /// Search query.
        query: String,

        /// Maximum number of results.
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Export memory to a file.
    Export {
        /// Agent ID to export memory for.
        #[arg(long)]
        agent: String,

        /// Output file path.
        #[arg(short, long)]
        output: String,

        /// Export format: "json" or "rvf" (default: "json").
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Import memory from a file.
    Import {
        /// Agent ID to import memory into.
        #[arg(long)]
        agent: String,

        /// Input file path.
        #[arg(short, long)]
        input: String,

        /// Skip WITNESS chain validation.
        #[arg(long)]
        skip_verify: bool,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `weft config`.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Show the full resolved configuration.
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show a specific configuration section.
    Section {
        /// Section name (e.g., "agents", "gateway", "channels").
        name: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `weft channels`.
#[derive(Subcommand)]
enum ChannelsAction {
    /// Show channel status table.
    Status {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Subcommands for `weft cron`.
#[derive(Subcommand)]
enum CronAction {
    /// List all cron jobs.
    List {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Add a new cron job.
    Add {
        /// Human-readable job name.
        #[arg(long)]
        name: String,

        /// Cron expression (e.g. "0 9 * * Mon-Fri").
        #[arg(long)]
        schedule: String,

        /// Agent prompt to execute when the job fires.
        #[arg(long)]
        prompt: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Remove a cron job by ID.
    Remove {
        /// Job ID to remove.
        job_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Enable a cron job.
    Enable {
        /// Job ID to enable.
        job_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Disable a cron job.
    Disable {
        /// Job ID to disable.
        job_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Manually trigger a cron job.
    Run {
        /// Job ID to run.
        job_id: String,

        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Agent(args) => commands::agent::run(args).await?,
        Commands::Gateway(args) => commands::gateway::run(args).await?,
        #[cfg(feature = "services")]
        Commands::McpServer(args) => commands::mcp_server::run(args).await?,
        Commands::Status(args) => commands::status::run(args).await?,
        Commands::Channels { action } => {
            let platform = clawft_platform::NativePlatform::new();
            match action {
                ChannelsAction::Status { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::channels::channels_status(&cfg);
                }
            }
        }
        Commands::Cron { action } => {
            let platform = clawft_platform::NativePlatform::new();
            match action {
                CronAction::List { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_list(&cfg)?;
                }
                CronAction::Add {
                    name,
                    schedule,
                    prompt,
                    config,
                } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_add(name, schedule, prompt, &cfg)?;
                }
                CronAction::Remove { job_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_remove(job_id, &cfg)?;
                }
                CronAction::Enable { job_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_enable(job_id, true, &cfg)?;
                }
                CronAction::Disable { job_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_enable(job_id, false, &cfg)?;
                }
                CronAction::Run { job_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::cron::cron_run(job_id, &cfg)?;
                }
            }
        }
        Commands::Sessions { action } => {
            let platform = clawft_platform::NativePlatform::new();
            match action {
                SessionsCmd::List { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::sessions::sessions_list(&cfg).await?;
                }
                SessionsCmd::Inspect { session_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::sessions::sessions_inspect(session_id, &cfg).await?;
                }
                SessionsCmd::Delete { session_id, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::sessions::sessions_delete(session_id, &cfg).await?;
                }
            }
        }
        Commands::Memory { action } => {
            let platform = clawft_platform::NativePlatform::new();
            match action {
                MemoryCmd::Show { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::memory_cmd::memory_show(&cfg).await?;
                }
                MemoryCmd::History { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::memory_cmd::memory_history(&cfg).await?;
                }
                MemoryCmd::Search {
                    query,
                    limit,
                    config,
                } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::memory_cmd::memory_search(&query, limit, &cfg).await?;
                }
                MemoryCmd::Export {
                    agent,
                    output,
                    format,
                    config,
                } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::memory_cmd::memory_export(&agent, &output, &format, &cfg).await?;
                }
                MemoryCmd::Import {
                    agent,
                    input,
                    skip_verify,
                    config,
                } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::memory_cmd::memory_import(&agent, &input, skip_verify, &cfg).await?;
                }
            }
        }
        Commands::Config { action } => {
            let platform = clawft_platform::NativePlatform::new();
            match action {
                ConfigCmd::Show { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::config_cmd::config_show(&cfg);
                }
                ConfigCmd::Section { name, config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::config_cmd::config_section(&cfg, &name);
                }
            }
        }
        Commands::Skills(args) => commands::skills_cmd::run(args).await?,
        Commands::Agents(args) => commands::agents_cmd::run(args)?,
        Commands::Workspace(args) => commands::workspace_cmd::run(args)?,
        Commands::Onboard(args) => commands::onboard::run(args).await?,
        Commands::Security(args) => commands::security_cmd::run(args)?,
        Commands::Help(args) => commands::help_cmd::run(args)?,
        Commands::Completions { shell } => match completions::Shell::from_str(&shell) {
            Some(s) => {
                let mut cmd = Cli::command();
                completions::generate_completions(&s, &mut cmd);
            }
            None => {
                eprintln!("unsupported shell: {shell}");
                eprintln!("supported: {}", completions::Shell::all_names().join(", "));
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
