//! [`DiscordChannelFactory`] -- creates Discord channels from JSON config.

use std::sync::Arc;

use clawft_types::config::DiscordConfig;
use clawft_types::error::ChannelError;

use crate::traits::{Channel, ChannelFactory};

use super::channel::DiscordChannel;

/// Factory for creating [`DiscordChannel`] instances from JSON configuration.
///
/// Expected config shape matches [`DiscordConfig`]:
///
/// ```json
/// {
///   "enabled": true,
///   "token": "Bot-Token-Here",
///   "allow_from": ["123456789"],
///   "gateway_url": "wss://gateway.discord.gg/?v=10&encoding=json",
///   "intents": 37377
/// }
/// ```
pub struct DiscordChannelFactory;

impl ChannelFactory for DiscordChannelFactory {
    fn channel_name(&self) -> &str {
        "discord"
    }

    fn build(&self, config: &serde_json::Value) -> Result<Arc<dyn Channel>, ChannelError> {
        let discord_config: DiscordConfig = serde_json::from_value(config.clone())
            .map_err(|e| ChannelError::Other(format!("invalid discord config: {e}")))?;

        if discord_config.token.is_empty() {
            return Err(ChannelError::Other(
                "missing 'token' in discord config".into(),
            ));
        }

        Ok(Arc::new(DiscordChannel::new(discord_config)))
    }
}
