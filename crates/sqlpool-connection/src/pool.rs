//! Connection pooling for database connections
//!
//! Requests are admitted in a fixed order: reuse an idle connection, open a
//! new one while under `connection_limit`, reject if queuing is disabled,
//! reject if the wait queue is full, otherwise queue. Released connections
//! go straight to the oldest waiter, or back to the idle list.
//!
//! # Example
//!
//! ```ignore
//! use sqlpool_connection::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(5).with_queue_limit(100);
//! let pool = ConnectionPool::new(config, connection_factory);
//!
//! let conn = pool.get().await?;
//! // Use connection...
//! // Connection returned to pool on drop
//!
//! let rows = pool.query("SELECT * FROM users WHERE id = ?", vec![42.into()]).await?;
//! pool.end().await?;
//! ```

mod config;
mod connection;
mod events;
mod pool;
mod query;
mod state;
mod stats;


pub use config::PoolConfig;
pub use connection::PoolConnection;
pub use events::{ConnectionId, PoolEvent};
pub use pool::{Acquire, ConnectionFactory, ConnectionPool};
pub use query::PendingQuery;
pub use stats::PoolStats;
