//! Error types for sqlpool

use thiserror::Error;

/// Core error type for pool and connection operations
#[derive(Error, Debug)]
pub enum SqlPoolError {
    /// Acquire attempted after shutdown began
    #[error("Pool is closed")]
    PoolClosed,

    /// Pool at capacity and `wait_for_connections` is disabled
    #[error("No connections available")]
    NoConnectionAvailable,

    /// Pool at capacity and the wait queue is full
    #[error("Queue limit reached")]
    QueueLimitReached,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,
}

/// Result type alias for sqlpool operations
pub type Result<T> = std::result::Result<T, SqlPoolError>;
