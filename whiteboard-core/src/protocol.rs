//! Wire protocol between server nodes and canvas clients.
//!
//! ## Client -> Server
//!
//! - `{"type": "draw", "op": {...}}`
//! - `{"type": "clearCanvas"}`
//!
//! ## Server -> Client
//!
//! - `{"type": "draw", "op": {...}}` — broadcast relay
//! - `{"type": "clearCanvas"}`
//! - `{"type": "initialData", "operations": [...]}` — once on connect
//! - `{"type": "periodicUpdate", "operations": [...]}` — reconciliation
//! - `{"type": "userJoinedSuccess", "success": true, "user_id": "..."}`
//! - `{"type": "allActiveUsers", "users": [...]}`
//! - `{"type": "userDisconnected", "users": [...]}`
//!
//! Connect and disconnect are transport-level lifecycle events, not
//! protocol messages; the server hooks them into session join/leave.
//! Clients must render idempotently: the same operation may arrive
//! both as a live `draw` relay and inside a later `periodicUpdate`.

use serde::{Deserialize, Serialize};

use crate::op::DrawOperation;

/// Client-to-server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Apply one drawing primitive to the shared canvas.
    Draw {
        /// The primitive to persist and fan out.
        op: DrawOperation,
    },
    /// Wipe the entire canvas history.
    ClearCanvas,
}

/// Server-to-client events, fanned out to every connected socket on
/// every node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Relay of a persisted drawing primitive.
    Draw {
        /// The persisted primitive, `created_at` populated.
        op: DrawOperation,
    },
    /// The canvas history was wiped.
    ClearCanvas,
    /// Full history snapshot sent to a newly connected socket.
    InitialData {
        /// Complete persisted history in append order.
        operations: Vec<DrawOperation>,
    },
    /// Periodic reconciliation snapshot of the full history.
    PeriodicUpdate {
        /// Complete persisted history in append order.
        operations: Vec<DrawOperation>,
    },
    /// A user finished registering.
    UserJoinedSuccess {
        /// Whether the registration was persisted.
        success: bool,
        /// Connection identifier of the user that joined.
        user_id: String,
    },
    /// Recomputed set of all connected users.
    AllActiveUsers {
        /// Connection identifiers, in registration order.
        users: Vec<String>,
    },
    /// A user disconnected; payload is the remaining user set.
    UserDisconnected {
        /// Connection identifiers still registered.
        users: Vec<String>,
    },
}

impl ServerMessage {
    /// Short name of the event, for logs and metrics labels.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Draw { .. } => "draw",
            Self::ClearCanvas => "clearCanvas",
            Self::InitialData { .. } => "initialData",
            Self::PeriodicUpdate { .. } => "periodicUpdate",
            Self::UserJoinedSuccess { .. } => "userJoinedSuccess",
            Self::AllActiveUsers { .. } => "allActiveUsers",
            Self::UserDisconnected { .. } => "userDisconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::OpKind;

    #[test]
    fn test_client_message_parse_draw() {
        let json = r#"{"type":"draw","op":{"type":"pen","x":3,"y":4,"prevX":1,"prevY":2,"color":"black","size":1}}"#;
        let msg: ClientMessage = serde_json::from_str(json).expect("should parse");
        match msg {
            ClientMessage::Draw { op } => {
                assert_eq!(op.kind, OpKind::Pen);
                assert_eq!(op.prev_x, Some(1.0));
            }
            ClientMessage::ClearCanvas => panic!("Expected Draw"),
        }
    }

    #[test]
    fn test_client_message_parse_clear() {
        let json = r#"{"type":"clearCanvas"}"#;
        let msg: ClientMessage = serde_json::from_str(json).expect("should parse");
        assert!(matches!(msg, ClientMessage::ClearCanvas));
    }

    #[test]
    fn test_server_message_serialize_joined() {
        let msg = ServerMessage::UserJoinedSuccess {
            success: true,
            user_id: "abc-123".to_string(),
        };
        let json = serde_json::to_string(&msg).expect("should serialize");
        assert!(json.contains(r#""type":"userJoinedSuccess""#));
        assert!(json.contains(r#""user_id":"abc-123""#));
        assert!(json.contains(r#""success":true"#));
    }

    #[test]
    fn test_server_message_serialize_periodic_update() {
        let msg = ServerMessage::PeriodicUpdate {
            operations: vec![DrawOperation::line(0.0, 0.0, 1.0, 1.0, "red", 2.0)],
        };
        let json = serde_json::to_string(&msg).expect("should serialize");
        assert!(json.contains(r#""type":"periodicUpdate""#));
        assert!(json.contains(r#""color":"red""#));
    }

    #[test]
    fn test_server_message_serialize_user_lists() {
        let msg = ServerMessage::AllActiveUsers {
            users: vec!["u1".into(), "u2".into()],
        };
        let json = serde_json::to_string(&msg).expect("should serialize");
        assert!(json.contains(r#""type":"allActiveUsers""#));
        assert!(json.contains(r#"["u1","u2"]"#));

        let msg = ServerMessage::UserDisconnected { users: vec![] };
        let json = serde_json::to_string(&msg).expect("should serialize");
        assert!(json.contains(r#""type":"userDisconnected""#));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ServerMessage::ClearCanvas.event_name(), "clearCanvas");
        assert_eq!(
            ServerMessage::InitialData { operations: vec![] }.event_name(),
            "initialData"
        );
    }
}
