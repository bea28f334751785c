//! Process configuration from the environment.
//!
//! Every tunable is externally injected, never baked into the engine:
//!
//! - `WHITEBOARD_PORT` — listen port (default 5000)
//! - `RECONCILE_INTERVAL_SECS` — reconciliation period (default 5)
//! - `LOCK_TTL_SECS` — lease TTL for named locks (default 5)
//! - `COORDINATION_URL` — coordination service address
//! - `STORE_URL` — durable store connection string
//! - `BUS_URL` — fan-out bus address
//!
//! The service addresses describe the deployment's backing services.
//! This binary ships the embedded in-process implementations; a
//! service-backed build wires clients for these addresses in at the
//! `StateStore`/`LockService`/`FanoutBus` seams.

use std::str::FromStr;
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the HTTP/WebSocket listener binds.
    pub port: u16,
    /// Period of the reconciliation broadcaster.
    pub reconcile_interval: Duration,
    /// Lease TTL for the named locks.
    pub lock_ttl: Duration,
    /// Coordination service address, if this deployment has one.
    pub coordination_url: Option<String>,
    /// Durable store connection string, if this deployment has one.
    pub store_url: Option<String>,
    /// Fan-out bus address, if this deployment has one.
    pub bus_url: Option<String>,
}

impl Config {
    /// Read configuration from the environment, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("WHITEBOARD_PORT", DEFAULT_PORT),
            reconcile_interval: Duration::from_secs(env_parse("RECONCILE_INTERVAL_SECS", 5)),
            lock_ttl: Duration::from_secs(env_parse("LOCK_TTL_SECS", 5)),
            coordination_url: std::env::var("COORDINATION_URL").ok(),
            store_url: std::env::var("STORE_URL").ok(),
            bus_url: std::env::var("BUS_URL").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            reconcile_interval: Duration::from_secs(5),
            lock_ttl: Duration::from_secs(5),
            coordination_url: None,
            store_url: None,
            bus_url: None,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.reconcile_interval, Duration::from_secs(5));
        assert_eq!(config.lock_ttl, Duration::from_secs(5));
        assert!(config.store_url.is_none());
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("WHITEBOARD_TEST_GARBAGE_PORT", "not-a-number");
        let port: u16 = env_parse("WHITEBOARD_TEST_GARBAGE_PORT", 5000);
        assert_eq!(port, 5000);
        std::env::remove_var("WHITEBOARD_TEST_GARBAGE_PORT");
    }

    #[test]
    fn test_env_parse_reads_override() {
        std::env::set_var("WHITEBOARD_TEST_TTL_SECS", "9");
        let ttl: u64 = env_parse("WHITEBOARD_TEST_TTL_SECS", 5);
        assert_eq!(ttl, 9);
        std::env::remove_var("WHITEBOARD_TEST_TTL_SECS");
    }
}
