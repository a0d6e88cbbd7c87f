//! `weft channels` -- inspect channel configuration status.
//!
//! Reads the configuration and displays a table summarizing which
//! channels are enabled, and whether credentials are present.
//!
//! # Example
//!
//! ```text
//! weft channels status
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use clawft_types::config::Config;

/// Display a table of channel status from the given configuration.
pub fn channels_status(config: &Config) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["CHANNEL", "ENABLED", "CONFIG STATUS"]);

    // Known channels.
    add_row(
        &mut table,
        "telegram",
        config.channels.telegram.enabled,
        !config.channels.telegram.token.is_empty(),
    );
    add_row(
        &mut table,
        "slack",
        config.channels.slack.enabled,
        !config.channels.slack.bot_token.is_empty(),
    );
    add_row(
        &mut table,
        "discord",
        config.channels.discord.enabled,
        !config.channels.discord.token.is_empty(),
    );
    add_row(
        &mut table,
        "whatsapp",
        config.channels.whatsapp.enabled,
        !config.channels.whatsapp.bridge_token.is_empty(),
    );
    add_row(
        &mut table,
        "email",
        config.channels.email.enabled,
        !config.channels.email.imap_host.is_empty(),
    );
    add_row(
        &mut table,
        "feishu",
        config.channels.feishu.enabled,
        !config.channels.feishu.app_id.is_empty(),
    );
    add_row(
        &mut table,
        "dingtalk",
        config.channels.dingtalk.enabled,
        !config.channels.dingtalk.client_id.is_empty(),
    );
    add_row(
        &mut table,
        "mochat",
        config.channels.mochat.enabled,
        !config.channels.mochat.claw_token.is_empty(),
    );
    add_row(
        &mut table,
        "qq",
        config.channels.qq.enabled,
        !config.channels.qq.app_id.is_empty(),
    );

    // Unknown / extra channels from config.
    for name in config.channels.extra.keys() {
        table.add_row([name.as_str(), "unknown", "present in config"]);
    }

    println!("{table}");
}

/// Add a row for a known channel.
fn add_row(table: &mut Table, name: &str, enabled: bool, has_credentials: bool) {
    let enabled_str = if enabled { "yes" } else { "no" };
    let config_status = match (enabled, has_credentials) {
        (true, true) => "configured",
        (true, false) => "MISSING credentials",
        (false, true) => "credentials present",
        (false, false) => "not configured",
    };
    table.add_row([name, enabled_str, config_status]);
}
