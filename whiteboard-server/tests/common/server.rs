//! Test server harness for integration tests.
//!
//! Spins up a real Axum node on a random port for WebSocket clients,
//! over the embedded backing services.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use whiteboard_core::{BroadcastBus, MemoryLockService, MemoryStore};

use whiteboard_server::engine::SyncEngine;
use whiteboard_server::socket::handle_socket;
use whiteboard_server::AppState;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    engine: SyncEngine,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test node on a random available port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or the server fails to bind.
    pub async fn start() -> Self {
        let engine = SyncEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryLockService::new()),
            Arc::new(BroadcastBus::new()),
        );
        Self::start_with_engine(engine).await
    }

    /// Start a node over an existing engine, so several nodes can
    /// share backing services.
    pub async fn start_with_engine(engine: SyncEngine) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let state = AppState::new(engine.clone());

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .with_state(state);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            engine,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the WebSocket URL for connecting to the server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Get the engine (for test assertions against the store).
    #[allow(dead_code)]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}

// Handler implementations for the test node

async fn health_handler() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
