//! sqlpool Connection - Connection pooling
//!
//! This crate multiplexes database requests over a bounded set of
//! connections, queuing callers fairly once the limit is reached.

pub mod pool;

pub use pool::{
    Acquire, ConnectionFactory, ConnectionId, ConnectionPool, PendingQuery, PoolConfig,
    PoolConnection, PoolEvent, PoolStats,
};
