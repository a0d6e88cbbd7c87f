//! Built-in slash commands for the `weft agent` interactive REPL.
//!
//! Provides the standard set of commands:
//!
//! - `/help [topic]` -- show available commands or topic help
//! - `/skills` -- list available skills
//! - `/use <skill>` -- activate a skill
//! - `/agent <name>` -- switch agent
//! - `/clear` -- clear context
//! - `/status` -- show current agent, model, skills
//! - `/quit` -- exit

use super::registry::{InteractiveContext, SlashCommand, SlashCommandRegistry};

/// Register all built-in slash commands into the given registry.
pub fn register_builtins(registry: &mut SlashCommandRegistry) {
    registry.register(Box::new(HelpCommand));
    registry.register(Box::new(SkillsCommand));
    registry.register(Box::new(UseCommand));
    registry.register(Box::new(AgentCommand));
    registry.register(Box::new(ClearCommand));
    registry.register(Box::new(StatusCommand));
    registry.register(Box::new(QuitCommand));
    registry.register(Box::new(ToolsCommand));
}

// ── /help ─────────────────────────────────────────────────────────────────

/// `/help [topic]` -- show available commands or topic-specific help.
struct HelpCommand;

impl SlashCommand for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands or topic help"
    }

    fn execute(&self, args: &str, _ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let topic = args.trim();

        if topic.is_empty() {
            return Ok(format_general_help());
        }

        match topic {
            "skills" => Ok("Skills are reusable LLM instruction bundles.\n\
                 Use /skills to list available skills.\n\
                 Use /use <name> to activate a skill for the current session."
                .into()),
            "agents" => Ok(
                "Agents are custom personas with their own system prompts and skills.\n\
                 Use /agent <name> to switch to a different agent.\n\
                 Use /status to see the current agent."
                    .into(),
            ),
            "tools" => Ok(
                "Tools are functions the agent can call during conversation.\n\
                 Use /tools to list all registered tools."
                    .into(),
            ),
            _ => Ok(format!("No help available for topic: {topic}")),
        }
    }
}

/// Format the general help text listing all built-in commands.
fn format_general_help() -> String {
    let mut output = String::from("Commands:\n");
    output.push_str("  /help [topic]     -- Show this help or topic-specific help\n");
    output.push_str("  /skills           -- List available skills\n");
    output.push_str("  /use <skill>      -- Activate a skill\n");
    output.push_str("  /agent <name>     -- Switch agent\n");
    output.push_str("  /tools            -- List available tools\n");
    output.push_str("  /clear            -- Clear context\n");
    output.push_str("  /status           -- Show current agent, model, skills\n");
    output.push_str("  /quit             -- Exit the session\n");
    output.push_str("\nTopics: skills, agents, tools");
    output
}

// ── /skills ───────────────────────────────────────────────────────────────

/// `/skills` -- list available skills from the context.
struct SkillsCommand;

impl SlashCommand for SkillsCommand {
    fn name(&self) -> &str {
        "skills"
    }

    fn description(&self) -> &str {
        "List available skills"
    }

    fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        if ctx.skill_names.is_empty() {
            return Ok("No skills available.".into());
        }

        let mut output = format!("Available skills ({}):\n", ctx.skill_names.len());
        for name in &ctx.skill_names {
            let marker = if name == &ctx.active_skill {
                " (active)"
            } else {
                ""
            };
            output.push_str(&format!("  - {name}{marker}\n"));
        }
        Ok(output)
    }
}

// ── /use ──────────────────────────────────────────────────────────────────

/// `/use <skill>` -- activate a skill for the current session.
struct UseCommand;

impl SlashCommand for UseCommand {
    fn name(&self) -> &str {
        "use"
    }

    fn description(&self) -> &str {
        "Activate a skill"
    }

    fn execute(&self, args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let skill_name = args.trim();

        if skill_name.is_empty() {
            if ctx.active_skill.is_empty() {
                return Ok("No skill is currently active. Usage: /use <skill-name>".into());
            }
            ctx.active_skill.clear();
            return Ok("Skill deactivated.".into());
        }

        if !ctx.skill_names.contains(&skill_name.to_string()) {
            return Ok(format!(
                "Unknown skill: {skill_name}\nUse /skills to see available skills."
            ));
        }

        ctx.active_skill = skill_name.to_string();
        Ok(format!("Activated skill: {skill_name}"))
    }
}

// ── /agent ────────────────────────────────────────────────────────────────

/// `/agent <name>` -- switch to a different agent.
struct AgentCommand;

impl SlashCommand for AgentCommand {
    fn name(&self) -> &str {
        "agent"
    }

    fn description(&self) -> &str {
        "Switch agent"
    }

    fn execute(&self, args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let agent_name = args.trim();

        if agent_name.is_empty() {
            if ctx.active_agent.is_empty() {
                return Ok("Using default agent. Usage: /agent <name>".into());
            }
            return Ok(format!("Current agent: {}", ctx.active_agent));
        }

        if !ctx.agent_names.contains(&agent_name.to_string()) {
            let mut msg = format!("Unknown agent: {agent_name}\n");
            if ctx.agent_names.is_empty() {
                msg.push_str("No agents are registered.");
            } else {
                msg.push_str("Available agents:\n");
                for name in &ctx.agent_names {
                    msg.push_str(&format!("  - {name}\n"));
                }
            }
            return Ok(msg);
        }

        ctx.active_agent = agent_name.to_string();
        Ok(format!("Switched to agent: {agent_name}"))
    }
}

// ── /tools ────────────────────────────────────────────────────────────────

/// `/tools` -- list registered tools.
struct ToolsCommand;

impl SlashCommand for ToolsCommand {
    fn name(&self) -> &str {
        "tools"
    }

    fn description(&self) -> &str {
        "List available tools"
    }

    fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        if ctx.tool_names.is_empty() {
            return Ok("No tools registered.".into());
        }

        let mut output = format!("Registered tools ({}):\n", ctx.tool_names.len());
        for name in &ctx.tool_names {
            output.push_str(&format!("  - {name}\n"));
        }
        Ok(output)
    }
}

// ── /clear ────────────────────────────────────────────────────────────────

/// `/clear` -- clear session context.
struct ClearCommand;

impl SlashCommand for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn description(&self) -> &str {
        "Clear context"
    }

    fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        ctx.active_skill.clear();
        Ok("[session cleared]".into())
    }
}

// ── /status ───────────────────────────────────────────────────────────────

/// `/status` -- show current agent, model, and active skills.
struct StatusCommand;

impl SlashCommand for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Show current agent, model, skills"
    }

    fn execute(&self, _args: &str, ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        let agent = if ctx.active_agent.is_empty() {
            "(default)"
        } else {
            &ctx.active_agent
        };

        let skill = if ctx.active_skill.is_empty() {
            "(none)"
        } else {
            &ctx.active_skill
        };

        Ok(format!(
            "Agent:  {agent}\n\
             Model:  {}\n\
             Skill:  {skill}\n\
             Tools:  {} registered\n\
             Skills: {} available\n\
             Agents: {} available",
            ctx.model,
            ctx.tool_names.len(),
            ctx.skill_names.len(),
            ctx.agent_names.len(),
        ))
    }
}

// ── /quit ─────────────────────────────────────────────────────────────────

/// `/quit` -- signal exit from the interactive session.
///
/// This command returns a special sentinel string that the REPL loop
/// should check to break out of the read-eval-print loop.
struct QuitCommand;

/// Sentinel value returned by `/quit` to signal session exit.
pub const QUIT_SENTINEL: &str = "__QUIT__";

impl SlashCommand for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn description(&self) -> &str {
        "Exit the session"
    }

    fn execute(&self, _args: &str, _ctx: &mut InteractiveContext) -> anyhow::Result<String> {
        Ok(QUIT_SENTINEL.into())
    }
}
