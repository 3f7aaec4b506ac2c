//! Connection pool implementation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use parking_lot::Mutex;
use sqlpool_core::{
    Command, Connection, MySqlFormatter, QueryResult, Result, SqlFormatter, SqlPoolError,
    StatementResult, Value,
};
use tokio::sync::{broadcast, oneshot};

use super::config::PoolConfig;
use super::connection::PoolConnection;
use super::events::{ConnectionId, PoolEvent};
use super::query::PendingQuery;
use super::state::{ConnectionSlot, LiveConnection, PoolState, Waiter};
use super::stats::PoolStats;

/// Factory trait for opening new physical connections
///
/// Implementations perform the connect and authentication handshake.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Open a new connection
    async fn connect(&self) -> Result<Arc<dyn Connection>>;
}

#[async_trait]
impl<T: ConnectionFactory> ConnectionFactory for Arc<T> {
    async fn connect(&self) -> Result<Arc<dyn Connection>> {
        (**self).connect().await
    }
}

/// How a request enters admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// A new `acquire` call.
    Fresh,
    /// A waiter popped from the queue whose connection was removed.
    Requeue,
}

/// State shared by the pool handle, its connections and background tasks.
pub(crate) struct PoolShared {
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    formatter: Arc<dyn SqlFormatter>,
    state: Mutex<PoolState>,
    events: broadcast::Sender<PoolEvent>,
}

impl PoolShared {
    fn emit(&self, event: PoolEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Idle reuse, then a new connection, then rejection or queuing.
    ///
    /// Hands the waiter back when the request must be rejected on the spot.
    fn admit(
        self: &Arc<Self>,
        state: &mut PoolState,
        waiter: Waiter,
        admission: Admission,
    ) -> std::result::Result<(), Waiter> {
        if state.closed {
            let _ = waiter.send(Err(SqlPoolError::PoolClosed));
            return Ok(());
        }

        if let Some(live) = state.idle.pop_front() {
            let id = live.id();
            match waiter.send(Ok(PoolConnection::new(live, Arc::clone(self)))) {
                Ok(()) => {
                    tracing::debug!(connection_id = %id, "reusing idle connection");
                    self.emit(PoolEvent::Acquire { id });
                }
                Err(returned) => {
                    if let Some(live) = returned.ok().and_then(PoolConnection::disarm) {
                        state.idle.push_front(live);
                    }
                }
            }
            return Ok(());
        }

        if self.config.has_capacity(state.all.len()) {
            let slot = state.insert_slot();
            tracing::debug!(
                connection_id = %slot.id(),
                total = state.all.len(),
                "opening new connection"
            );
            tokio::spawn(Arc::clone(self).connect(slot, waiter));
            return Ok(());
        }

        if !self.config.wait_for_connections() {
            tracing::debug!(total = state.all.len(), "pool exhausted, not waiting");
            let _ = waiter.send(Err(SqlPoolError::NoConnectionAvailable));
            return Ok(());
        }

        match admission {
            Admission::Fresh => {
                if self.config.queue_full(state.waiters.len()) {
                    return Err(waiter);
                }
                state.waiters.push_back(waiter);
                tracing::debug!(waiting = state.waiters.len(), "queued acquire request");
                self.emit(PoolEvent::Enqueue);
            }
            // Keep its place at the head of the line.
            Admission::Requeue => state.waiters.push_front(waiter),
        }
        Ok(())
    }

    async fn connect(self: Arc<Self>, slot: Arc<ConnectionSlot>, waiter: Waiter) {
        let id = slot.id();
        let result = self.factory.connect().await;

        let mut stale = None;
        let delivery = {
            let mut state = self.state.lock();
            if state.closed {
                state.remove(id);
                stale = result.ok();
                Some((waiter, Err(SqlPoolError::PoolClosed)))
            } else if slot.is_detached() && result.is_ok() {
                // Removed while connecting: the slot no longer counts, so
                // the caller goes through admission again.
                stale = result.ok();
                let _ = self.admit(&mut state, waiter, Admission::Requeue);
                None
            } else {
                match result {
                    Ok(connection) => {
                        slot.mark_ready(Arc::clone(&connection));
                        tracing::debug!(connection_id = %id, "connection established");
                        self.emit(PoolEvent::Connection { id });
                        self.emit(PoolEvent::Acquire { id });
                        let conn = PoolConnection::new(
                            LiveConnection { slot, connection },
                            Arc::clone(&self),
                        );
                        Some((waiter, Ok(conn)))
                    }
                    Err(err) => {
                        tracing::warn!(connection_id = %id, error = %err, "failed to connect");
                        slot.mark_failed();
                        self.emit(PoolEvent::ConnectError { id });
                        Some((waiter, Err(err)))
                    }
                }
            }
        };

        if let Some(connection) = stale {
            tracing::debug!(connection_id = %id, "discarding stale connection");
            connection.destroy();
        }

        // Outside the lock: if the caller gave up, dropping the connection
        // releases it.
        if let Some((waiter, outcome)) = delivery {
            let _ = waiter.send(outcome);
        }
    }

    pub(crate) fn release(self: &Arc<Self>, live: LiveConnection) {
        let id = live.id();
        let mut state = self.state.lock();

        if state.closed {
            tracing::debug!(connection_id = %id, "released after shutdown, dropping");
            return;
        }

        if live.slot.is_detached() {
            self.readmit_next(&mut state);
            return;
        }

        if live.connection.is_closed() {
            tracing::debug!(connection_id = %id, "released connection is closed, removing");
            self.remove_locked(&mut state, id);
            return;
        }

        let mut live = live;
        while let Some(waiter) = state.next_waiter() {
            match waiter.send(Ok(PoolConnection::new(live, Arc::clone(self)))) {
                Ok(()) => {
                    tracing::debug!(connection_id = %id, "handed connection to waiter");
                    self.emit(PoolEvent::Acquire { id });
                    return;
                }
                Err(returned) => match returned.ok().and_then(PoolConnection::disarm) {
                    Some(back) => live = back,
                    None => return,
                },
            }
        }

        state.idle.push_back(live);
        tracing::debug!(connection_id = %id, idle = state.idle.len(), "connection idle");
        self.emit(PoolEvent::Release { id });
    }

    /// A removed connection cannot serve the next waiter, so that waiter
    /// goes through admission again.
    fn readmit_next(self: &Arc<Self>, state: &mut PoolState) {
        if let Some(waiter) = state.next_waiter() {
            let _ = self.admit(state, waiter, Admission::Requeue);
        }
    }

    pub(crate) fn remove_connection(self: &Arc<Self>, id: ConnectionId) {
        let mut state = self.state.lock();
        self.remove_locked(&mut state, id);
    }

    fn remove_locked(self: &Arc<Self>, state: &mut PoolState, id: ConnectionId) {
        if let Some(slot) = state.remove(id) {
            slot.detach();
            tracing::debug!(connection_id = %id, total = state.all.len(), "removed connection");
        }
        self.readmit_next(state);
    }
}

/// A pool of database connections
///
/// Requests are served from idle connections first, then by opening new
/// connections up to `connection_limit`, then by queuing (bounded by
/// `queue_limit`). Cloning the pool is cheap and shares the same
/// connections.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    /// Create a new pool that formats SQL MySQL-style
    pub fn new<F: ConnectionFactory>(config: PoolConfig, factory: F) -> Self {
        Self::with_formatter(config, factory, MySqlFormatter::new())
    }

    /// Create a new pool with a custom SQL formatter
    pub fn with_formatter<F, S>(config: PoolConfig, factory: F, formatter: S) -> Self
    where
        F: ConnectionFactory,
        S: SqlFormatter + 'static,
    {
        let (events, _) = broadcast::channel(config.event_capacity());
        Self {
            shared: Arc::new(PoolShared {
                config,
                factory: Arc::new(factory),
                formatter: Arc::new(formatter),
                state: Mutex::new(PoolState::new()),
                events,
            }),
        }
    }

    /// Request a connection
    ///
    /// The outcome is delivered through the returned [`Acquire`] future,
    /// which may stay pending while the request is queued. The only
    /// immediate failure is [`SqlPoolError::QueueLimitReached`].
    ///
    /// Must be called within a Tokio runtime: opening a connection runs on
    /// a spawned task.
    pub fn acquire(&self) -> Result<Acquire> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.shared.state.lock();
        match self.shared.admit(&mut state, tx, Admission::Fresh) {
            Ok(()) => Ok(Acquire { rx }),
            Err(_) => {
                tracing::debug!(waiting = state.waiters.len(), "queue limit reached");
                Err(SqlPoolError::QueueLimitReached)
            }
        }
    }

    /// Get a connection from the pool, waiting if needed
    pub async fn get(&self) -> Result<PoolConnection> {
        self.acquire()?.await
    }

    /// Return a connection to the pool
    ///
    /// Equivalent to dropping it.
    pub fn release(&self, connection: PoolConnection) {
        drop(connection);
    }

    /// Forget a connection that is permanently unusable
    ///
    /// The connection leaves the pool's books, so a queued request may
    /// open a replacement. Safe to call more than once.
    pub fn remove_connection(&self, id: ConnectionId) {
        self.shared.remove_connection(id);
    }

    /// Close the pool and every connection it owns
    ///
    /// New and queued requests fail with [`SqlPoolError::PoolClosed`].
    /// Resolves once every established connection closed, or with the first
    /// close error.
    pub async fn end(&self) -> Result<()> {
        let (connections, waiters) = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.idle.clear();
            let connections: Vec<_> = state
                .all
                .drain(..)
                .filter_map(|(_, slot)| slot.connection())
                .collect();
            let waiters: Vec<_> = state.waiters.drain(..).collect();
            (connections, waiters)
        };

        for waiter in waiters {
            let _ = waiter.send(Err(SqlPoolError::PoolClosed));
        }

        tracing::info!(connections = connections.len(), "closing connection pool");
        if connections.is_empty() {
            return Ok(());
        }

        // Closes run detached and keep going after the first error.
        let mut closes: FuturesUnordered<_> = connections
            .into_iter()
            .map(|conn| tokio::spawn(async move { conn.close().await }))
            .collect();

        while let Some(joined) = closes.next().await {
            let closed = match joined {
                Ok(result) => result,
                Err(_) => Err(SqlPoolError::Cancelled),
            };
            if let Err(err) = closed {
                tracing::warn!(error = %err, pending = closes.len(), "failed to close connection");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Connections whose connect attempt failed
    ///
    /// They keep counting toward `connection_limit` until passed to
    /// [`ConnectionPool::remove_connection`].
    pub fn failed_connections(&self) -> Vec<ConnectionId> {
        self.shared
            .state
            .lock()
            .all
            .values()
            .filter(|slot| slot.is_failed())
            .map(|slot| slot.id())
            .collect()
    }

    /// Run a query on a pooled connection
    ///
    /// The connection is released as soon as the query finishes, whatever
    /// its outcome.
    pub fn query(&self, sql: impl Into<String>, values: Vec<Value>) -> PendingQuery<QueryResult> {
        let command = Command::query(sql).with_values(values);
        self.dispatch(command, |conn, command| async move {
            conn.query(command.sql(), command.values()).await
        })
    }

    /// Run a prepared statement on a pooled connection
    pub fn execute(
        &self,
        sql: impl Into<String>,
        values: Vec<Value>,
    ) -> PendingQuery<StatementResult> {
        let command = Command::execute(sql).with_values(values);
        self.dispatch(command, |conn, command| async move {
            conn.execute(command.sql(), command.values()).await
        })
    }

    fn dispatch<T, F, Fut>(&self, command: Command, run: F) -> PendingQuery<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn Connection>, Arc<Command>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let command = Arc::new(command);
        let acquire = self.acquire();
        let task_command = Arc::clone(&command);

        let handle = tokio::spawn(async move {
            let conn = acquire?.await?;
            tracing::debug!(connection_id = %conn.id(), sql = task_command.sql(), "running command");
            // A panic in `run` unwinds through `conn`, which releases it.
            let result = run(Arc::clone(conn.inner()), task_command).await;
            conn.release();
            result
        });

        PendingQuery::new(command, handle)
    }

    /// Substitute `?` and `??` placeholders
    pub fn format(&self, sql: &str, values: &[Value]) -> String {
        self.shared.formatter.format(sql, values)
    }

    /// Render a value as a SQL literal
    pub fn escape(&self, value: &Value) -> String {
        self.shared.formatter.escape(value)
    }

    /// Render an identifier quoted
    pub fn escape_id(&self, identifier: &str) -> String {
        self.shared.formatter.escape_id(identifier)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.shared.events.subscribe()
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats::new(
            state.all.len(),
            state.idle.len(),
            state.waiters.len(),
            state.closed,
        )
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

/// A pending connection request
///
/// Resolves exactly once, with a connection or the reason none was given.
#[derive(Debug)]
#[must_use = "dropping an Acquire abandons the request"]
pub struct Acquire {
    rx: oneshot::Receiver<Result<PoolConnection>>,
}

impl Future for Acquire {
    type Output = Result<PoolConnection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // The sender only disappears without answering when the pool is gone.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(SqlPoolError::PoolClosed)))
    }
}
