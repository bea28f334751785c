//! Cross-node fan-out seam.
//!
//! One node's broadcast must reach sockets held by every node.
//! Delivery is best-effort with no ordering guarantee across topics;
//! the periodic reconciliation broadcast heals any client that misses
//! a publication.

use tokio::sync::broadcast;

use crate::protocol::ServerMessage;

/// Errors from the fan-out channel.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The publication could not be handed to the backing channel.
    #[error("fan-out publish failed: {0}")]
    Publish(String),
}

/// Publish/subscribe channel fanning server events out to sockets.
///
/// Local delivery always flows through a broadcast receiver returned
/// by [`subscribe`](Self::subscribe); a cross-node implementation
/// bridges remote publications into the same channel.
pub trait FanoutBus: Send + Sync {
    /// Publish an event to every subscribed socket on every node.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Publish`] when the backing channel rejects
    /// the event. Publishing with no subscribers is not an error.
    fn publish(&self, message: ServerMessage) -> Result<(), BusError>;

    /// Subscribe to the event stream.
    fn subscribe(&self) -> broadcast::Receiver<ServerMessage>;
}

/// Default capacity of the embedded broadcast channel.
const DEFAULT_BUS_CAPACITY: usize = 256;

/// Embedded in-process bus over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<ServerMessage>,
}

impl BroadcastBus {
    /// Create a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity. Slow receivers
    /// that fall more than `capacity` events behind observe a lag
    /// error and skip ahead.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FanoutBus for BroadcastBus {
    fn publish(&self, message: ServerMessage) -> Result<(), BusError> {
        // No receivers is okay
        let _ = self.tx.send(message);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }
}
