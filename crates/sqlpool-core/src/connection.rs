//! Connection trait implemented by database drivers

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// A single physical database connection
///
/// The wire protocol and authentication handshake live behind this trait.
/// Connections are created by a pool's connection factory and are shared
/// as `Arc<dyn Connection>` between the pool and the caller holding them.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mysql", "postgresql")
    fn driver_name(&self) -> &str;

    /// Run a query that returns rows (SELECT)
    ///
    /// `params` are substituted client-side by the driver.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Run a prepared statement with server-side parameters
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Gracefully close the connection, waiting for the server to
    /// acknowledge the quit.
    async fn close(&self) -> Result<()>;

    /// Tear the connection down immediately without a close handshake.
    ///
    /// The default only logs. Drivers owning a socket shut it down here.
    fn destroy(&self) {
        tracing::debug!(driver = self.driver_name(), "destroying connection");
    }

    /// Check if the connection is closed
    ///
    /// A connection that hit a fatal protocol error must report `true`
    /// so the pool stops handing it out.
    fn is_closed(&self) -> bool;
}
