//! Channel-aware markdown dispatch.
//!
//! Routes outbound message content through the appropriate
//! [`MarkdownConverter`] based on the target channel name.

use std::collections::HashMap;

use super::MarkdownConverter;
use super::discord::DiscordMarkdownConverter;
use super::slack::SlackMarkdownConverter;
use super::telegram::TelegramMarkdownConverter;

/// Dispatches markdown conversion based on channel name.
///
/// Maps channel names (e.g. "telegram", "slack", "discord") to their
/// respective [`MarkdownConverter`] implementations. Unknown channels
/// get the content passed through unchanged.
pub struct MarkdownDispatcher {
    converters: HashMap<String, Box<dyn MarkdownConverter>>,
}

impl MarkdownDispatcher {
    /// Create a dispatcher with all built-in converters registered.
    pub fn new() -> Self {
        let mut converters: HashMap<String, Box<dyn MarkdownConverter>> = HashMap::new();
        converters.insert("telegram".into(), Box::new(TelegramMarkdownConverter));
        converters.insert("slack".into(), Box::new(SlackMarkdownConverter));
        converters.insert("discord".into(), Box::new(DiscordMarkdownConverter));
        Self { converters }
    }

    /// Convert markdown content for the given channel.
    ///
    /// If the channel has a registered converter, applies it.
    /// Otherwise returns the content unchanged.
    pub fn convert(&self, channel: &str, content: &str) -> String {
        match self.converters.get(channel) {
            Some(converter) => converter.convert(content),
            None => content.to_string(),
        }
    }

    /// Register a custom converter for a channel name.
    #[allow(dead_code)]
    pub fn register(&mut self, channel: impl Into<String>, converter: Box<dyn MarkdownConverter>) {
        self.converters.insert(channel.into(), converter);
    }

    /// List all registered channel names.
    #[allow(dead_code)]
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.converters.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MarkdownDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
