//! Message bus for async channel-agent communication.
//!
//! Provides a thread-safe [`MessageBus`] using bounded MPSC channels
//! for routing inbound messages (from channels) and outbound messages
//! (from the agent pipeline) with configurable backpressure.
//!
//! On native, uses tokio bounded MPSC channels.
//! On browser/WASM, uses futures-channel unbounded MPSC channels.
//!
//! Ported from Python `nanobot/bus/queue.py`.

#[cfg(feature = "native")]
use tokio::sync::Mutex;

use tracing::debug;

use clawft_types::error::ClawftError;
use clawft_types::event::{InboundMessage, OutboundMessage};

/// Default channel capacity for bounded MPSC channels (native only).
#[cfg(feature = "native")]
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Native implementation (tokio channels)
// ---------------------------------------------------------------------------

#[cfg(feature = "native")]
pub struct MessageBus {
    inbound_tx: tokio::sync::mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<tokio::sync::mpsc::Receiver<InboundMessage>>,
    outbound_tx: tokio::sync::mpsc::Sender<OutboundMessage>,
    outbound_rx: Mutex<tokio::sync::mpsc::Receiver<OutboundMessage>>,
}

#[cfg(feature = "native")]
impl MessageBus {
    /// Create a new message bus with the default channel capacity (1024).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new message bus with a custom channel capacity.
    ///
    /// Higher capacity allows more burst buffering at the cost of memory.
    /// Lower capacity provides tighter backpressure.
    pub fn with_capacity(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = tokio::sync::mpsc::channel(capacity);

        debug!(capacity, "MessageBus created with bounded channels");

        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
        }
    }

    /// Publish an inbound message (from a channel adapter) to the bus.
    ///
    /// Uses `try_send` to avoid requiring the caller to be async.
    /// Returns an error if the channel is closed or the buffer is full.
    pub fn publish_inbound(&self, msg: InboundMessage) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "publishing inbound message"
        );
        self.inbound_tx.try_send(msg).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => {
                ClawftError::Channel("inbound channel full (backpressure)".into())
            }
            tokio::sync::mpsc::error::TrySendError::Closed(_) => {
                ClawftError::Channel("inbound channel closed".into())
            }
        })
    }

    /// Publish an inbound message, waiting asynchronously if the buffer is full.
    ///
    /// Prefer this over [`publish_inbound`](Self::publish_inbound) in async
    /// contexts to avoid dropping messages under backpressure.
    pub async fn publish_inbound_async(
        &self,
        msg: InboundMessage,
    ) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "publishing inbound message (async)"
        );
        self.inbound_tx
            .send(msg)
            .await
            .map_err(|e| ClawftError::Channel(format!("inbound channel closed: {e}")))
    }

    /// Consume the next inbound message from the bus.
    ///
    /// Returns `None` if the channel is closed and all buffered messages
    /// have been consumed.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await
    }

    /// Dispatch an outbound message (from the agent pipeline) to the bus.
    ///
    /// Uses `try_send` to avoid requiring the caller to be async.
    /// Returns an error if the channel is closed or the buffer is full.
    pub fn dispatch_outbound(&self, msg: OutboundMessage) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "dispatching outbound message"
        );
        self.outbound_tx.try_send(msg).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => {
                ClawftError::Channel("outbound channel full (backpressure)".into())
            }
            tokio::sync::mpsc::error::TrySendError::Closed(_) => {
                ClawftError::Channel("outbound channel closed".into())
            }
        })
    }

    /// Dispatch an outbound message, waiting asynchronously if the buffer is full.
    pub async fn dispatch_outbound_async(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "dispatching outbound message (async)"
        );
        self.outbound_tx
            .send(msg)
            .await
            .map_err(|e| ClawftError::Channel(format!("outbound channel closed: {e}")))
    }

    /// Consume the next outbound message from the bus.
    ///
    /// Returns `None` if the channel is closed and all buffered messages
    /// have been consumed.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv().await
    }

    /// Get a cloneable sender handle for publishing inbound messages.
    ///
    /// Channel adapters should clone this sender so that multiple producers
    /// (e.g. Telegram, Slack, Discord) can publish concurrently.
    pub fn inbound_sender(&self) -> tokio::sync::mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    /// Get a cloneable sender handle for dispatching outbound messages.
    ///
    /// Pipeline stages or agent tasks can clone this sender for concurrent
    /// outbound dispatch.
    pub fn outbound_sender(&self) -> tokio::sync::mpsc::Sender<OutboundMessage> {
        self.outbound_tx.clone()
    }
}

// ---------------------------------------------------------------------------
// Browser implementation (futures-channel)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "native"))]
pub struct MessageBus {
    inbound_tx: futures_util::lock::Mutex<futures_channel::mpsc::UnboundedSender<InboundMessage>>,
    inbound_rx: futures_util::lock::Mutex<futures_channel::mpsc::UnboundedReceiver<InboundMessage>>,
    outbound_tx: futures_util::lock::Mutex<futures_channel::mpsc::UnboundedSender<OutboundMessage>>,
    outbound_rx: futures_util::lock::Mutex<futures_channel::mpsc::UnboundedReceiver<OutboundMessage>>,
}

#[cfg(not(feature = "native"))]
impl MessageBus {
    /// Create a new message bus (browser: unbounded channels).
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = futures_channel::mpsc::unbounded();
        let (outbound_tx, outbound_rx) = futures_channel::mpsc::unbounded();

        debug!("MessageBus created with unbounded channels (browser)");

        Self {
            inbound_tx: futures_util::lock::Mutex::new(inbound_tx),
            inbound_rx: futures_util::lock::Mutex::new(inbound_rx),
            outbound_tx: futures_util::lock::Mutex::new(outbound_tx),
            outbound_rx: futures_util::lock::Mutex::new(outbound_rx),
        }
    }

    /// Create a new message bus (capacity parameter ignored on browser).
    pub fn with_capacity(_capacity: usize) -> Self {
        Self::new()
    }

    /// Publish an inbound message to the bus.
    pub fn publish_inbound(&self, msg: InboundMessage) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "publishing inbound message"
        );
        // For browser single-threaded context, try_lock should always succeed.
        if let Some(tx) = self.inbound_tx.try_lock() {
            tx.unbounded_send(msg).map_err(|_| {
                ClawftError::Channel("inbound channel closed".into())
            })
        } else {
            Err(ClawftError::Channel("inbound channel busy".into()))
        }
    }

    /// Publish an inbound message (async version).
    pub async fn publish_inbound_async(
        &self,
        msg: InboundMessage,
    ) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "publishing inbound message (async)"
        );
        let tx = self.inbound_tx.lock().await;
        tx.unbounded_send(msg).map_err(|_| {
            ClawftError::Channel("inbound channel closed".into())
        })
    }

    /// Consume the next inbound message from the bus.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        use futures_util::StreamExt;
        let mut rx = self.inbound_rx.lock().await;
        rx.next().await
    }

    /// Dispatch an outbound message to the bus.
    pub fn dispatch_outbound(&self, msg: OutboundMessage) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "dispatching outbound message"
        );
        if let Some(tx) = self.outbound_tx.try_lock() {
            tx.unbounded_send(msg).map_err(|_| {
                ClawftError::Channel("outbound channel closed".into())
            })
        } else {
            Err(ClawftError::Channel("outbound channel busy".into()))
        }
    }

    /// Dispatch an outbound message (async version).
    pub async fn dispatch_outbound_async(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), ClawftError> {
        debug!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "dispatching outbound message (async)"
        );
        let tx = self.outbound_tx.lock().await;
        tx.unbounded_send(msg).map_err(|_| {
            ClawftError::Channel("outbound channel closed".into())
        })
    }

    /// Consume the next outbound message from the bus.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        use futures_util::StreamExt;
        let mut rx = self.outbound_rx.lock().await;
        rx.next().await
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
