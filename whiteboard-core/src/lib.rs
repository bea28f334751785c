//! # Whiteboard Core
//!
//! Core model and collaborator seams for the shared whiteboard backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              whiteboard-core                │
//! ├─────────────────────────────────────────────┤
//! │  Data model      │  Wire protocol           │
//! │  - DrawOperation │  - Client events         │
//! │  - Session ids   │  - Server broadcasts     │
//! ├─────────────────────────────────────────────┤
//! │  Backing-service seams                      │
//! │  - StateStore (durable history + sessions)  │
//! │  - LockService (TTL-leased named locks)     │
//! │  - FanoutBus (cross-node publish/subscribe) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Each seam ships with an embedded in-process implementation. A
//! multi-node deployment injects service-backed implementations
//! (etcd-style leases, a document store, a pub/sub adapter) at the
//! same traits.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod lock;
pub mod op;
pub mod protocol;
pub mod store;

pub use bus::{BroadcastBus, BusError, FanoutBus};
pub use lock::{Lease, LockService, MemoryLockService, CANVAS_LOCK, DEFAULT_LOCK_TTL, SESSION_LOCK};
pub use op::{DrawOperation, OpKind};
pub use protocol::{ClientMessage, ServerMessage};
pub use store::{current_timestamp, MemoryStore, StateStore, StoreError};

/// Core crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
