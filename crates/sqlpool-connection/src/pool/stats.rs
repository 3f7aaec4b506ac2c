//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Snapshot of a connection pool's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Every connection the pool owns, including ones still connecting
    /// and ones whose connect failed
    total: usize,
    /// Connections available for reuse
    idle: usize,
    /// Requests waiting for a connection
    waiting: usize,
    closed: bool,
}

impl PoolStats {
    pub fn new(total: usize, idle: usize, waiting: usize, closed: bool) -> Self {
        Self {
            total,
            idle,
            waiting,
            closed,
        }
    }

    /// Get the total number of connections
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get the number of idle connections
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Get the number of connections not sitting idle
    pub fn active(&self) -> usize {
        self.total.saturating_sub(self.idle)
    }

    /// Get the number of waiting requests
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Calculate pool utilization as a fraction (0.0 to 1.0)
    ///
    /// Returns 0.0 if total is 0 to avoid division by zero.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.active() as f64 / self.total as f64
        }
    }

    /// Check if every connection is in use
    pub fn is_full(&self) -> bool {
        self.idle == 0 && self.total > 0
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new(0, 0, 0, false)
    }
}
