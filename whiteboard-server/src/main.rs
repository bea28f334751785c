//! # Whiteboard Server
//!
//! One backend node of the shared whiteboard. N stateless nodes share
//! one coordination service, one durable store, and one fan-out bus;
//! this binary ships the embedded in-process implementations of all
//! three, suitable for a single node and for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whiteboard_core::{BroadcastBus, MemoryLockService, MemoryStore};

use metrics_exporter_prometheus::PrometheusHandle;
use whiteboard_server::engine::SyncEngine;
use whiteboard_server::socket::handle_socket;
use whiteboard_server::{health, metrics, reconcile, AppState, Config};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,whiteboard_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,whiteboard_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let config = Config::from_env();
    log_backing_services(&config);

    // Embedded backing services. A service-backed deployment swaps
    // these for clients of the configured addresses.
    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(MemoryLockService::new());
    let bus = Arc::new(BroadcastBus::new());

    let engine = SyncEngine::new(store, locks, bus).with_lock_ttl(config.lock_ttl);
    let state = AppState::new(engine.clone());

    // Per-node reconciliation broadcaster
    let _reconcile_handle = reconcile::spawn(engine, config.reconcile_interval);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = Router::new()
        .merge(metrics_router)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/ws", get(websocket_handler))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Whiteboard server node listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Log which backing services this deployment points at.
fn log_backing_services(config: &Config) {
    for (name, url) in [
        ("coordination service", &config.coordination_url),
        ("durable store", &config.store_url),
        ("fan-out bus", &config.bus_url),
    ] {
        match url {
            Some(url) => tracing::warn!(
                "{name} configured at {url}, but this build ships the embedded implementation; \
                 external backends are wired in at the whiteboard-core seams"
            ),
            None => tracing::info!("{name}: embedded in-process implementation"),
        }
    }
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// WebSocket handler for client connections.
#[tracing::instrument(name = "websocket_connect", skip(ws, state))]
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
