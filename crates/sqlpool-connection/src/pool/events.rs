//! Lifecycle events published by the pool

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pool-assigned identity of a physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle notification for pool observers
///
/// Obtain a receiver with `ConnectionPool::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// An acquire request was queued
    Enqueue,
    /// A new physical connection was established
    Connection { id: ConnectionId },
    /// A connect attempt failed; the slot stays counted until removed
    ConnectError { id: ConnectionId },
    /// A connection was handed to a caller
    Acquire { id: ConnectionId },
    /// A connection returned to the idle list
    Release { id: ConnectionId },
}
