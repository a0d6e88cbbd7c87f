//! `weft help [topic]` -- Show help for a topic or general overview.
//!
//! Available topics: `skills`, `agents`, `tools`, `commands`, `config`.
//!
//! When no topic is given, prints a general overview of all subcommands.

use clap::Args;

use crate::help_text;

/// Arguments for `weft help`.
#[derive(Args)]
pub struct HelpArgs {
    /// Topic to display help for (skills, agents, tools, commands, config).
    pub topic: Option<String>,
}

/// Run the help subcommand.
pub fn run(args: HelpArgs) -> anyhow::Result<()> {
    match args.topic {
        Some(topic) => println!("{}", help_text::topic_help(&topic)),
        None => println!("{}", help_text::general_help()),
    }
    Ok(())
}
