//! Synchronization engine.
//!
//! Serializes the four mutating operations — draw, clear, join, leave
//! — through named distributed locks, applies them to the durable
//! store, and republishes them over the fan-out bus. Every operation
//! has the same shape:
//!
//! 1. acquire the named lock for the affected resource; on
//!    unavailability the whole operation is dropped, not queued
//! 2. mutate the store
//! 3. release the lock, whether or not the mutation succeeded
//! 4. broadcast over the bus, on success only
//!
//! Under contention whichever node acquires the lock first proceeds;
//! the loser's operation is dropped and logged. The mutation and the
//! broadcast are not transactional together: a bus failure after a
//! committed mutation leaves a window that the periodic reconciliation
//! broadcast closes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use whiteboard_core::{
    BusError, DrawOperation, FanoutBus, Lease, LockService, ServerMessage, StateStore, StoreError,
    CANVAS_LOCK, DEFAULT_LOCK_TTL, SESSION_LOCK,
};

use crate::metrics;

/// Errors from a dropped engine operation.
///
/// Neither variant is fatal and neither is surfaced to the requesting
/// client; the operation simply does not propagate. Lock contention
/// and a coordination-service outage are deliberately
/// indistinguishable.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The named lock is held elsewhere or the coordination service
    /// could not be reached.
    #[error("lock '{0}' unavailable")]
    LockUnavailable(String),
    /// The durable store rejected the mutation or read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine shared by every connection on one node.
///
/// Holds no cross-request mutable state of its own; all shared state
/// lives behind the three injected backing services, so cloning is
/// cheap and N engines over the same services model N server nodes.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn StateStore>,
    locks: Arc<dyn LockService>,
    bus: Arc<dyn FanoutBus>,
    lock_ttl: Duration,
}

impl SyncEngine {
    /// Create an engine over the three backing services.
    #[must_use]
    pub fn new(
        store: Arc<dyn StateStore>,
        locks: Arc<dyn LockService>,
        bus: Arc<dyn FanoutBus>,
    ) -> Self {
        Self {
            store,
            locks,
            bus,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }

    /// Override the lease TTL used for lock acquisition.
    ///
    /// Leases are not renewed mid-hold, so critical sections must
    /// complete well inside this window.
    #[must_use]
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Get the durable store handle.
    #[must_use]
    pub fn store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    /// Subscribe to the fan-out bus this engine publishes to.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.bus.subscribe()
    }

    /// Persist one drawing primitive and fan it out.
    ///
    /// Returns the operation as persisted, `created_at` populated.
    ///
    /// # Errors
    ///
    /// [`SyncError::LockUnavailable`] when the canvas lock could not be
    /// taken, [`SyncError::Store`] when persistence failed. Either way
    /// the operation is dropped and nothing is broadcast.
    pub async fn submit_draw(&self, op: DrawOperation) -> Result<DrawOperation, SyncError> {
        let lease = self.acquire(CANVAS_LOCK).await?;
        let result = self.store.append_operation(op).await;
        self.release(lease).await;

        let persisted = result.inspect_err(|_| metrics::record_op_dropped("store_failure"))?;
        metrics::record_op_persisted();
        self.publish(ServerMessage::Draw {
            op: persisted.clone(),
        });
        Ok(persisted)
    }

    /// Wipe the entire canvas history and fan out the clear.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`submit_draw`](Self::submit_draw).
    pub async fn clear(&self) -> Result<(), SyncError> {
        let lease = self.acquire(CANVAS_LOCK).await?;
        let result = self.store.clear_operations().await;
        self.release(lease).await;

        result.inspect_err(|_| metrics::record_op_dropped("store_failure"))?;
        self.publish(ServerMessage::ClearCanvas);
        Ok(())
    }

    /// Register a connecting user and broadcast the new user set.
    ///
    /// Idempotent: a user id that already has a live session is left
    /// untouched and nothing is broadcast. Returns the full active
    /// user list either way.
    ///
    /// # Errors
    ///
    /// [`SyncError::LockUnavailable`] when the session lock could not
    /// be taken, [`SyncError::Store`] on a store failure.
    pub async fn join(&self, user_id: &str) -> Result<Vec<String>, SyncError> {
        let lease = self.acquire(SESSION_LOCK).await?;
        let result = self.register(user_id).await;
        self.release(lease).await;

        match result? {
            Some(users) => {
                self.publish(ServerMessage::UserJoinedSuccess {
                    success: true,
                    user_id: user_id.to_string(),
                });
                self.publish(ServerMessage::AllActiveUsers {
                    users: users.clone(),
                });
                Ok(users)
            }
            // Already registered: no duplicate row, no broadcast
            None => Ok(self.store.sessions().await?),
        }
    }

    /// Remove a disconnecting user and broadcast the remaining set.
    ///
    /// Idempotent: leaving without a live session is a no-op and
    /// nothing is broadcast.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`join`](Self::join).
    pub async fn leave(&self, user_id: &str) -> Result<Vec<String>, SyncError> {
        let lease = self.acquire(SESSION_LOCK).await?;
        let result = self.unregister(user_id).await;
        self.release(lease).await;

        match result? {
            Some(users) => {
                self.publish(ServerMessage::UserDisconnected {
                    users: users.clone(),
                });
                Ok(users)
            }
            None => Ok(self.store.sessions().await?),
        }
    }

    /// Full history snapshot for a newly connected socket.
    ///
    /// Plain read, no locking.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] when the read fails.
    pub async fn initial_data(&self) -> Result<Vec<DrawOperation>, SyncError> {
        Ok(self.store.operations().await?)
    }

    /// Publish a message on the fan-out bus, logging on failure.
    ///
    /// A failed publication after a committed mutation is not rolled
    /// back; the reconciliation broadcast catches clients up.
    pub fn publish(&self, message: ServerMessage) {
        let event = message.event_name();
        match self.bus.publish(message) {
            Ok(()) => metrics::record_broadcast(event),
            Err(BusError::Publish(reason)) => {
                tracing::warn!(event, reason, "fan-out publish failed");
            }
        }
    }

    async fn acquire(&self, key: &str) -> Result<Lease, SyncError> {
        match self.locks.acquire(key, self.lock_ttl).await {
            Some(lease) => Ok(lease),
            None => {
                metrics::record_op_dropped("lock_unavailable");
                tracing::info!(key, "lock unavailable, dropping operation");
                Err(SyncError::LockUnavailable(key.to_string()))
            }
        }
    }

    async fn release(&self, lease: Lease) {
        self.locks.release(lease).await;
    }

    /// Session insert under the session lock. `None` means the user
    /// was already registered.
    async fn register(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        if self.store.find_session(user_id).await?.is_some() {
            tracing::debug!(user_id, "user already registered");
            return Ok(None);
        }
        self.store.insert_session(user_id).await?;
        Ok(Some(self.store.sessions().await?))
    }

    /// Session delete under the session lock. `None` means the user
    /// had no live session.
    async fn unregister(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        if self.store.find_session(user_id).await?.is_none() {
            tracing::debug!(user_id, "no session to remove");
            return Ok(None);
        }
        self.store.remove_session(user_id).await?;
        Ok(Some(self.store.sessions().await?))
    }
}
