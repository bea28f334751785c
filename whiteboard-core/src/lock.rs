//! Coordination client seam: named, TTL-bounded exclusive leases.
//!
//! The lock keys are a fixed, small set — [`CANVAS_LOCK`] serializes
//! draw/clear mutations, [`SESSION_LOCK`] serializes join/leave. A
//! lease is never renewed mid-hold; a holder that crashes or hangs
//! loses the lock when the TTL elapses, which bounds worst-case
//! unavailability of a resource to one TTL window. Critical sections
//! must complete well inside the TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Lock key serializing canvas mutations (draw, clear).
pub const CANVAS_LOCK: &str = "canvas-lock";

/// Lock key serializing session-registry mutations (join, leave).
pub const SESSION_LOCK: &str = "session-lock";

/// Default lease TTL.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(5);

/// Opaque handle to a held lease.
///
/// Only the holder of the live token can release the lock; a stale
/// handle from an expired lease is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    key: String,
    token: u64,
}

impl Lease {
    /// The lock key this lease covers.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Lease-based exclusive locks granted by a coordination service.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Try to take the named lock for `ttl`.
    ///
    /// Returns `None` when the lock is unavailable — either a live
    /// lease already holds `key` or the coordination service could not
    /// be reached. Callers treat both identically and drop the
    /// attempted operation; there is no queueing and no retry here.
    async fn acquire(&self, key: &str, ttl: Duration) -> Option<Lease>;

    /// Release a lease. Idempotent: releasing an expired, unknown, or
    /// already-released lease is a no-op.
    async fn release(&self, lease: Lease);
}

#[derive(Debug)]
struct HeldLease {
    token: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct LockTable {
    held: HashMap<String, HeldLease>,
    next_token: u64,
}

/// Embedded in-process lock service with etcd-style lease semantics.
///
/// Clones share one lease table, so handing the same instance to
/// several engines models several nodes coordinating through one
/// service.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockService {
    inner: Arc<Mutex<LockTable>>,
}

impl MemoryLockService {
    /// Create an empty lock service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, LockTable> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn acquire(&self, key: &str, ttl: Duration) -> Option<Lease> {
        let now = Instant::now();
        let mut table = self.table();

        if let Some(held) = table.held.get(key) {
            if held.expires_at > now {
                tracing::debug!(key, "lock held by a live lease");
                return None;
            }
            // Expired lease: self-cleared, the slot is free again.
            tracing::debug!(key, "lease expired, reclaiming");
        }

        table.next_token += 1;
        let token = table.next_token;
        table.held.insert(
            key.to_string(),
            HeldLease {
                token,
                expires_at: now + ttl,
            },
        );
        Some(Lease {
            key: key.to_string(),
            token,
        })
    }

    async fn release(&self, lease: Lease) {
        let mut table = self.table();
        // Only the live token may clear the slot; a stale handle from
        // an expired lease must not free a successor's lock.
        if let Some(held) = table.held.get(lease.key()) {
            if held.token == lease.token {
                table.held.remove(lease.key());
            }
        }
    }
}
