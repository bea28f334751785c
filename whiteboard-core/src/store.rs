//! Durable state store seam.
//!
//! The store holds the append-only drawing history plus the set of
//! currently connected user identifiers. Every read re-queries the
//! store; nodes keep no local cache of canvas state. The embedded
//! [`MemoryStore`] serves tests and single-node deployments; a
//! multi-node deployment injects a document-store-backed
//! implementation at the same trait.

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::op::DrawOperation;

/// Errors from the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing service could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A read or write against the backing service failed.
    #[error("store operation failed: {0}")]
    Backend(String),
}

/// Append-only drawing history plus the active session set.
///
/// Sessions are keyed by `user_id` only; drawing operations carry no
/// relation to the session that produced them.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Append one operation, assigning its `created_at` timestamp.
    /// Returns the operation as persisted.
    async fn append_operation(&self, op: DrawOperation) -> Result<DrawOperation, StoreError>;

    /// Bulk-delete the entire drawing history.
    async fn clear_operations(&self) -> Result<(), StoreError>;

    /// Full drawing history in append order.
    async fn operations(&self) -> Result<Vec<DrawOperation>, StoreError>;

    /// Look up a session by user id.
    async fn find_session(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// Insert a session row for `user_id`.
    async fn insert_session(&self, user_id: &str) -> Result<(), StoreError>;

    /// Delete the session row for `user_id`.
    async fn remove_session(&self, user_id: &str) -> Result<(), StoreError>;

    /// All registered user ids, in registration order.
    async fn sessions(&self) -> Result<Vec<String>, StoreError>;
}

/// Current Unix timestamp in milliseconds.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Default)]
struct StoreInner {
    operations: Vec<DrawOperation>,
    sessions: Vec<String>,
}

/// Embedded in-process store.
///
/// Cloning is cheap and every clone shares the same state, so a handle
/// can be passed to each simulated node in tests the way a shared
/// database would be.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn append_operation(&self, mut op: DrawOperation) -> Result<DrawOperation, StoreError> {
        op.created_at = Some(current_timestamp());
        self.write().operations.push(op.clone());
        Ok(op)
    }

    async fn clear_operations(&self) -> Result<(), StoreError> {
        self.write().operations.clear();
        Ok(())
    }

    async fn operations(&self) -> Result<Vec<DrawOperation>, StoreError> {
        Ok(self.read().operations.clone())
    }

    async fn find_session(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read()
            .sessions
            .iter()
            .find(|s| s.as_str() == user_id)
            .cloned())
    }

    async fn insert_session(&self, user_id: &str) -> Result<(), StoreError> {
        self.write().sessions.push(user_id.to_string());
        Ok(())
    }

    async fn remove_session(&self, user_id: &str) -> Result<(), StoreError> {
        self.write().sessions.retain(|s| s != user_id);
        Ok(())
    }

    async fn sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read().sessions.clone())
    }
}
