//! Periodic reconciliation broadcaster.
//!
//! A fixed-interval task, independent of the event-driven path, that
//! re-reads the full drawing history and re-emits it to every socket
//! on this node. It bounds the staleness window for clients that
//! missed a live push — a dropped contended operation elsewhere, a
//! failed fan-out publish — and is deliberately redundant with
//! per-operation broadcasts; clients render idempotently.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use whiteboard_core::ServerMessage;

use crate::engine::SyncEngine;
use crate::metrics;

/// Default reconciliation period.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// Spawn the per-node reconciliation task.
pub fn spawn(engine: SyncEngine, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_secs = period.as_secs_f64(), "reconciliation task started");
        loop {
            ticker.tick().await;
            tick(&engine).await;
        }
    })
}

/// One reconciliation pass: plain unlocked read of the full history,
/// rebroadcast if non-empty. Each tick resends the full set; there is
/// no delta cursor and no coalescing.
pub async fn tick(engine: &SyncEngine) {
    match engine.store().operations().await {
        Ok(operations) => {
            if operations.is_empty() {
                return;
            }
            metrics::record_reconciliation(operations.len());
            engine.publish(ServerMessage::PeriodicUpdate { operations });
        }
        Err(err) => tracing::error!("reconciliation read failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;
    use whiteboard_core::{BroadcastBus, DrawOperation, MemoryLockService, MemoryStore};

    fn engine() -> SyncEngine {
        SyncEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryLockService::new()),
            Arc::new(BroadcastBus::new()),
        )
    }

    #[tokio::test]
    async fn test_tick_rebroadcasts_full_history() {
        let engine = engine();
        let first = engine
            .submit_draw(DrawOperation::line(0.0, 0.0, 1.0, 1.0, "red", 1.0))
            .await
            .expect("draw");
        let second = engine
            .submit_draw(DrawOperation::circle(5.0, 5.0, 2.0, "blue", 1.0))
            .await
            .expect("draw");

        let mut rx = engine.subscribe();
        tick(&engine).await;

        match rx.recv().await.expect("broadcast") {
            ServerMessage::PeriodicUpdate { operations } => {
                assert_eq!(operations, vec![first, second]);
            }
            other => panic!("Expected PeriodicUpdate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tick_is_silent_on_empty_history() {
        let engine = engine();
        let mut rx = engine.subscribe();
        tick(&engine).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_tick_is_silent_after_clear() {
        let engine = engine();
        engine
            .submit_draw(DrawOperation::line(0.0, 0.0, 1.0, 1.0, "red", 1.0))
            .await
            .expect("draw");
        engine.clear().await.expect("clear");

        let mut rx = engine.subscribe();
        tick(&engine).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_ticks_on_interval() {
        let engine = engine();
        engine
            .submit_draw(DrawOperation::line(0.0, 0.0, 1.0, 1.0, "red", 1.0))
            .await
            .expect("draw");

        let mut rx = engine.subscribe();
        let handle = spawn(engine, Duration::from_secs(5));

        // interval() fires immediately, then every period
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(matches!(
            rx.recv().await.expect("broadcast"),
            ServerMessage::PeriodicUpdate { .. }
        ));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(matches!(
            rx.recv().await.expect("broadcast"),
            ServerMessage::PeriodicUpdate { .. }
        ));

        handle.abort();
    }
}
