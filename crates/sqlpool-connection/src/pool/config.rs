//! Pool configuration types

use serde::{Deserialize, Serialize};
use sqlpool_core::{Result, SqlPoolError};

/// Configuration for a connection pool
///
/// Controls how many connections may exist and how callers are queued
/// once that limit is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of connections (0 = unbounded)
    connection_limit: usize,
    /// Maximum number of queued acquire requests (0 = unbounded)
    queue_limit: usize,
    /// Queue callers when at capacity instead of rejecting them
    wait_for_connections: bool,
    /// Buffer size of the lifecycle event channel
    event_capacity: usize,
}

impl PoolConfig {
    /// Create a new pool configuration with the given connection limit
    ///
    /// A limit of 0 lets the pool open as many connections as requested.
    pub fn new(connection_limit: usize) -> Self {
        Self {
            connection_limit,
            queue_limit: 0,
            wait_for_connections: true,
            event_capacity: 64,
        }
    }

    /// Parse a configuration from TOML, filling missing keys with defaults
    ///
    /// ```
    /// use sqlpool_connection::pool::PoolConfig;
    ///
    /// let config = PoolConfig::from_toml_str("connection_limit = 4").unwrap();
    /// assert_eq!(config.connection_limit(), 4);
    /// assert!(config.wait_for_connections());
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| SqlPoolError::Configuration(format!("Invalid pool config: {}", e)))
    }

    /// Set the maximum number of queued acquire requests (0 = unbounded)
    pub fn with_queue_limit(mut self, queue_limit: usize) -> Self {
        self.queue_limit = queue_limit;
        self
    }

    /// Set whether callers wait when the pool is at capacity
    pub fn with_wait_for_connections(mut self, wait: bool) -> Self {
        self.wait_for_connections = wait;
        self
    }

    /// Set the lifecycle event buffer size
    ///
    /// Slow subscribers that fall further behind than this lose events.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn connection_limit(&self) -> usize {
        self.connection_limit
    }

    pub fn queue_limit(&self) -> usize {
        self.queue_limit
    }

    pub fn wait_for_connections(&self) -> bool {
        self.wait_for_connections
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }

    /// Whether another connection may be opened when `current` exist
    pub(crate) fn has_capacity(&self, current: usize) -> bool {
        self.connection_limit == 0 || current < self.connection_limit
    }

    /// Whether the wait queue is full when it holds `queued` requests
    pub(crate) fn queue_full(&self, queued: usize) -> bool {
        self.queue_limit > 0 && queued >= self.queue_limit
    }
}

impl Default for PoolConfig {
    /// Defaults:
    /// - connection_limit: 10
    /// - queue_limit: 0 (unbounded)
    /// - wait_for_connections: true
    /// - event_capacity: 64
    fn default() -> Self {
        Self::new(10)
    }
}
