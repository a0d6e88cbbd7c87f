//! Email channel adapter factory.
//!
//! Creates [`EmailChannelAdapter`] instances from JSON configuration.

use std::sync::Arc;

use clawft_plugin::error::PluginError;
use clawft_plugin::traits::ChannelAdapter;

use super::channel::EmailChannelAdapter;
use super::types::EmailAdapterConfig;

/// Factory for creating [`EmailChannelAdapter`] instances from JSON.
///
/// Expected config shape matches [`EmailAdapterConfig`].
pub struct EmailChannelAdapterFactory;

impl EmailChannelAdapterFactory {
    /// Create an email channel adapter from a JSON config value.
    pub fn build(
        config: &serde_json::Value,
    ) -> Result<Arc<dyn ChannelAdapter>, PluginError> {
        let adapter_config: EmailAdapterConfig = serde_json::from_value(config.clone())
            .map_err(|e| PluginError::LoadFailed(format!("invalid email config: {e}")))?;

        // Validate required fields.
        if adapter_config.imap_host.is_empty() {
            return Err(PluginError::LoadFailed(
                "email config: imap_host is required".into(),
            ));
        }
        if adapter_config.email_address.is_empty() {
            return Err(PluginError::LoadFailed(
                "email config: email_address is required".into(),
            ));
        }
        if adapter_config.smtp_host.is_empty() {
            return Err(PluginError::LoadFailed(
                "email config: smtp_host is required".into(),
            ));
        }

        Ok(Arc::new(EmailChannelAdapter::new(adapter_config)))
    }
}
