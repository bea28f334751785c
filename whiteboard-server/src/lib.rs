//! # Whiteboard Server Library
//!
//! Shared types and functionality for a whiteboard backend node.
//! This library is used by both the binary and integration tests.
//!
//! A node serializes mutating operations (draw, clear, join, leave)
//! through named distributed locks, persists them in the durable
//! store, and republishes them over the fan-out bus so sockets on
//! every node receive the update. A periodic reconciliation task
//! rebroadcasts the full history to bound staleness for clients that
//! missed a push.

pub mod config;
pub mod engine;
pub mod health;
pub mod metrics;
pub mod reconcile;
pub mod socket;
pub mod validation;

pub use config::Config;
pub use engine::{SyncEngine, SyncError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Synchronization engine shared by every connection on this node.
    pub engine: SyncEngine,
}

impl AppState {
    /// Create application state around an engine.
    #[must_use]
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Get a reference to the engine.
    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }
}
