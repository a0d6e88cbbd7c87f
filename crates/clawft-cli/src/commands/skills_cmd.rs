//! `weft skills` -- CLI commands for skill discovery and management.
//!
//! Provides subcommands:
//!
//! - `weft skills list` -- list all skills (workspace, user, builtin) with
//!   source annotation.
//! - `weft skills show <name>` -- show skill details (description, variables,
//!   instructions preview).
//! - `weft skills install <path>` -- copy a skill to the user skills dir.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use comfy_table::{Table, presets};

use clawft_core::agent::skills_v2::SkillRegistry;
use clawft_types::skill::{SkillDefinition, SkillFormat};

/// Arguments for the `weft skills` subcommand.
#[derive(Args)]
pub struct SkillsArgs {
    #[command(subcommand)]
    pub action: SkillsAction,
}

/// Subcommands for `weft skills`.
#[derive(Subcommand)]
pub enum SkillsAction {
    /// List all skills with source annotation.
    List,

    /// Show details of a specific skill.
    Show {
        /// Skill name to inspect.
        name: String,
    },

    /// Install a skill from a local path.
    Install {
        /// Path to a skill directory (containing SKILL.md or skill.json).
        path: String,
    },

    /// Remove a user-installed skill.
    Remove {
        /// Skill name to remove from ~/.clawft/skills/.
        name: String,
    },
}

/// Run the skills subcommand.
pub async fn run(args: SkillsArgs) -> anyhow::Result<()> {
    let (ws_dir, user_dir) = discover_skill_dirs();
    let registry =
        SkillRegistry::discover(ws_dir.as_deref(), user_dir.as_deref(), Vec::new())
            .await
            .map_err(|e| anyhow::anyhow!("failed to discover skills: {e}"))?;

    match args.action {
        SkillsAction::List => skills_list(&registry, ws_dir.as_deref(), user_dir.as_deref()),
        SkillsAction::Show { name } => skills_show(&registry, &name),
        SkillsAction::Install { path } => skills_install(&path, user_dir.as_deref()),
        SkillsAction::Remove { name } => skills_remove(&name, user_dir.as_deref()),
    }
}

/// Discover workspace and user skill directories.
fn discover_skill_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    let user_dir = dirs::home_dir().map(|h| h.join(".clawft").join("skills"));

    // Walk upward from cwd to find .clawft/skills/
    let ws_dir = std::env::current_dir().ok().and_then(|cwd| {
        let mut dir: &Path = cwd.as_path();
        loop {
            let candidate = dir.join(".clawft").join("skills");
            if candidate.is_dir() {
                return Some(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return None,
            }
        }
    });

    (ws_dir, user_dir)
}

/// List all skills in a table with source annotation.
fn skills_list(
    registry: &SkillRegistry,
    ws_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let skills = registry.list();

    if skills.is_empty() {
        println!("No skills found.");
        println!();
        if let Some(dir) = user_dir {
            println!("User skills directory: {}", dir.display());
        }
        if let Some(dir) = ws_dir {
            println!("Workspace skills directory: {}", dir.display());
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(["NAME", "SOURCE", "FORMAT", "DESCRIPTION"]);

    // Sort by name for deterministic output.
    let mut sorted: Vec<&SkillDefinition> = skills;
    sorted.sort_by_key(|s| &s.name);

    for skill in sorted {
        let source = classify_source(skill, ws_dir, user_dir);
        let format = match skill.format {
            SkillFormat::SkillMd => "SKILL.md",
            SkillFormat::Legacy => "legacy",
        };
        let desc = truncate(&skill.description, 50);
        table.add_row([&skill.name, source, format, &desc]);
    }

    println!("{table}");
    println!();
    println!("Total: {} skill(s)", registry.len());

    Ok(())
}

/// Show details of a specific skill.
fn skills_show(registry: &SkillRegistry, name: &str) -> anyhow::Result<()> {
    let skill = registry.get(name).ok_or_else(|| {
        anyhow::anyhow!("skill not found: {name}\nUse 'weft skills list' to see available skills.")
    })?;

    println!("Skill: {}", skill.name);
    println!("Description: {}", skill.description);

    if !skill.version.is_empty() {
        println!("Version: {}", skill.version);
    }

    println!(
        "Format: {}",
        match skill.format {
            SkillFormat::SkillMd => "SKILL.md",
            SkillFormat::Legacy => "legacy (skill.json)",
        }
    );

    if let Some(ref path) = skill.source_path {
        println!("Source: {}", path.display());
    }

    println!("User-invocable: {}", skill.user_invocable);

    if !skill.variables.is_empty() {
        println!("Variables: {}", skill.variables.join(", "));
    }

    if let Some(ref hint) = skill.argument_hint {
        println!("Argument hint: {hint}");
    }

    if !skill.allowed_tools.is_empty() {
        println!("Allowed tools: {}", skill.allowed_tools.join(", "));
    }

    if !skill.metadata.is_empty() {
        println!("Metadata:");
        for (key, value) in &skill.metadata {
            println!("  {key}: {value}");
        }
    }

    if !skill.instructions.is_empty() {
        println!();
        println!("Instructions (preview):");
        println!("---");
        // Show first 500 characters of instructions.
        let preview = truncate(&skill.instructions, 500);
        println!("{preview}");
        if skill.instructions.len() > 500 {
            println!("... ({} chars total)", skill.instructions.len());
        }
        println!("---");
    }

    Ok(())
}

/// Install a skill from a local path to the user skills directory.
fn skills_install(source_path: &str, user_dir: Option<&Path>) -> anyhow::Result<()> {
    let user_dir = user_dir.ok_or_else(|| {
        anyhow::anyhow!(
            "cannot determine user skills directory (no home directory). \
             Set $HOME or use an explicit path."
        )
    })?;

    let source = PathBuf::from(source_path);
    if !source.exists() {
        anyhow::bail!("source path does not exist: {source_path}");
    }

    // Determine skill name from source directory name.
    let skill_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("cannot determine skill name from path: {source_path}"))?;

    let dest = user_dir.join(skill_name);

    // Ensure user skills directory exists.
    std::fs::create_dir_all(user_dir)
        .map_err(|e| anyhow::anyhow!("failed to create user skills directory: {e}"))?;

    if dest.exists() {
        anyhow::bail!(
            "skill '{skill_name}' already exists at {}. Remove it first.",
            dest.display()
        );
    }

    // Copy directory recursively.
    copy_dir_recursive(&source, &dest).map_err(|e| anyhow::anyhow!("failed to copy skill: {e}"))?;

    println!("Installed skill '{skill_name}' to {}", dest.display());

    Ok(())
}

/// Remove a user-installed skill from `~/.clawft/skills/<name>/`.
///
/// Only removes skills from the user directory. Workspace and built-in
/// skills cannot be removed via this command.
fn skills_remove(name: &str, user_dir: Option<&Path>) -> anyhow::Result<()> {
    let user_dir = user_dir.ok_or_else(|| {
        anyhow::anyhow!(
            "cannot determine user skills directory (no home directory). \
             Set $HOME or use an explicit path."
        )
    })?;

    let skill_path = user_dir.join(name);

    if !skill_path.exists() {
        anyhow::bail!(
            "skill '{name}' not found in user skills directory ({}). \
             Only user-installed skills can be removed.",
            user_dir.display()
        );
    }

    std::fs::remove_dir_all(&skill_path)
        .map_err(|e| anyhow::anyhow!("failed to remove skill '{name}': {e}"))?;

    println!("Removed skill '{name}' from {}", skill_path.display());

    Ok(())
}

/// Classify the source of a skill for display.
fn classify_source(
    skill: &SkillDefinition,
    ws_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> &'static str {
    if let Some(ref path) = skill.source_path {
        if let Some(ws) = ws_dir
            && path.starts_with(ws)
        {
            return "workspace";
        }
        if let Some(ud) = user_dir
            && path.starts_with(ud)
        {
            return "user";
        }
    }
    "builtin"
}

/// Truncate a string to `max_len` characters, appending "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Recursively copy a directory.
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let dest_path = dst.join(entry.file_name());

        if entry_path.is_dir() {
            copy_dir_recursive(&entry_path, &dest_path)?;
        } else {
            std::fs::copy(&entry_path, &dest_path)?;
        }
    }
    Ok(())
}
