//! [`PluginHost`] -- manages channel plugin lifecycle.
//!
//! The plugin host is responsible for:
//!
//! - Registering [`ChannelFactory`] instances
//! - Creating channel instances from configuration
//! - Starting and stopping channels (each in its own tokio task)
//! - Routing outbound messages to the correct channel

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::traits::*;
use clawft_types::error::ChannelError;
use clawft_types::event::OutboundMessage;

/// Manages channel plugins: registration, lifecycle, and message routing.
///
/// Channels are created from [`ChannelFactory`] instances, started in
/// individual tokio tasks with their own [`CancellationToken`], and stopped
/// gracefully on shutdown.
pub struct PluginHost {
    /// Registered channel factories, keyed by channel name.
    factories: RwLock<HashMap<String, Arc<dyn ChannelFactory>>>,
    /// Active channel instances, keyed by channel name.
    channels: RwLock<HashMap<String, Arc<dyn Channel>>>,
    /// Cancellation tokens for running channel tasks.
    cancel_tokens: RwLock<HashMap<String, CancellationToken>>,
    /// Join handles for running channel tasks.
    task_handles: RwLock<HashMap<String, JoinHandle<()>>>,
    /// The host interface provided to channel plugins.
    host_impl: Arc<dyn ChannelHost>,
}

impl PluginHost {
    /// Create a new `PluginHost` with the given [`ChannelHost`] implementation.
    pub fn new(host: Arc<dyn ChannelHost>) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            cancel_tokens: RwLock::new(HashMap::new()),
            task_handles: RwLock::new(HashMap::new()),
            host_impl: host,
        }
    }

    /// Register a channel factory.
    ///
    /// If a factory with the same channel name is already registered,
    /// it will be replaced.
    pub async fn register_factory(&self, factory: Arc<dyn ChannelFactory>) {
        let name = factory.channel_name().to_owned();
        info!(channel = %name, "registering channel factory");
        self.factories.write().await.insert(name, factory);
    }

    /// Initialize a channel from its JSON config section.
    ///
    /// Looks up the factory by `name`, invokes [`ChannelFactory::build`],
    /// and stores the resulting channel instance. The channel is **not**
    /// started -- call [`start_channel`](PluginHost::start_channel) or
    /// [`start_all`](PluginHost::start_all) afterwards.
    pub async fn init_channel(
        &self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let factories = self.factories.read().await;
        let factory = factories
            .get(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?;

        let channel = factory.build(config)?;
        info!(channel = %name, "channel initialized");
        self.channels.write().await.insert(name.to_owned(), channel);
        Ok(())
    }

    /// Start all initialized channels.
    ///
    /// Each channel is started in its own tokio task. Returns a list of
    /// `(channel_name, result)` pairs indicating success or failure for
    /// each channel's initial setup.
    pub async fn start_all(&self) -> Vec<(String, Result<(), ChannelError>)> {
        let channels = self.channels.read().await;
        let names: Vec<String> = channels.keys().cloned().collect();
        drop(channels);

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let result = self.start_channel(&name).await;
            results.push((name, result));
        }
        results
    }

    /// Stop all running channels gracefully.
    ///
    /// Cancels each channel's token and awaits task completion. Returns
    /// a list of `(channel_name, result)` pairs.
    pub async fn stop_all(&self) -> Vec<(String, Result<(), ChannelError>)> {
        let tokens = self.cancel_tokens.read().await;
        let names: Vec<String> = tokens.keys().cloned().collect();
        drop(tokens);

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let result = self.stop_channel(&name).await;
            results.push((name, result));
        }
        results
    }

    /// Start a specific channel by name.
    ///
    /// Spawns a tokio task that calls [`Channel::start`] with the host
    /// interface and a cancellation token.
    pub async fn start_channel(&self, name: &str) -> Result<(), ChannelError> {
        let channels = self.channels.read().await;
        let channel = channels
            .get(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?
            .clone();
        drop(channels);

        let cancel = CancellationToken::new();
        let host = self.host_impl.clone();
        let channel_name = name.to_owned();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(async move {
            info!(channel = %channel_name, "starting channel");
            if let Err(e) = channel.start(host, cancel_clone).await {
                error!(channel = %channel_name, error = %e, "channel exited with error");
            } else {
                info!(channel = %channel_name, "channel stopped");
            }
        });

        self.cancel_tokens
            .write()
            .await
            .insert(name.to_owned(), cancel);
        self.task_handles
            .write()
            .await
            .insert(name.to_owned(), handle);

        Ok(())
    }

    /// Stop a specific channel by name.
    ///
    /// Cancels the channel's token and waits for the task to finish.
    pub async fn stop_channel(&self, name: &str) -> Result<(), ChannelError> {
        let token = self
            .cancel_tokens
            .write()
            .await
            .remove(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_owned()))?;

        info!(channel = %name, "stopping channel");
        token.cancel();

        if let Some(handle) = self.task_handles.write().await.remove(name) {
            if let Err(e) = handle.await {
                warn!(channel = %name, error = %e, "channel task panicked");
            }
        }

        Ok(())
    }

    /// Route an outbound message to the appropriate channel.
    pub async fn send_to_channel(
        &self,
        msg: &OutboundMessage,
    ) -> Result<MessageId, ChannelError> {
        let channels = self.channels.read().await;
        let channel = channels
            .get(&msg.channel)
            .ok_or_else(|| ChannelError::NotFound(msg.channel.clone()))?
            .clone();
        drop(channels);

        channel.send(msg).await
    }

    /// Get status of all initialized channels.
    pub async fn get_status(&self) -> HashMap<String, ChannelStatus> {
        let channels = self.channels.read().await;
        channels
            .iter()
            .map(|(name, ch)| (name.clone(), ch.status()))
            .collect()
    }

    /// Get the list of registered factory names.
    pub async fn registered_channels(&self) -> Vec<String> {
        self.factories.read().await.keys().cloned().collect()
    }

    /// Get the list of active (initialized) channel names.
    pub async fn active_channels(&self) -> Vec<String> {
        self.channels.read().await.keys().cloned().collect()
    }
}
