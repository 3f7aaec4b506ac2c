//! Caller-side handle to a pooled connection

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use sqlpool_core::Connection;

use super::events::ConnectionId;
use super::pool::PoolShared;
use super::state::{Attachment, ConnectionSlot, LiveConnection};

/// A connection borrowed from the pool
///
/// When dropped, the connection is released back to the pool: handed to
/// the oldest waiter if there is one, otherwise put on the idle list.
pub struct PoolConnection {
    id: ConnectionId,
    connection: Arc<dyn Connection>,
    slot: Option<Arc<ConnectionSlot>>,
    pool: Arc<PoolShared>,
}

impl PoolConnection {
    pub(crate) fn new(live: LiveConnection, pool: Arc<PoolShared>) -> Self {
        Self {
            id: live.id(),
            connection: live.connection,
            slot: Some(live.slot),
            pool,
        }
    }

    /// Pool-assigned identity of the underlying connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the underlying connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Whether the pool still owns this connection
    ///
    /// Returns false once the connection was removed with
    /// `ConnectionPool::remove_connection`.
    pub fn is_attached(&self) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|slot| slot.attachment() == Attachment::Active)
    }

    /// Return the connection to the pool
    pub fn release(self) {}

    /// Remove the connection from the pool and tear it down
    ///
    /// Frees a slot so a queued request can open a replacement.
    pub fn destroy(mut self) {
        if self.slot.take().is_some() {
            self.pool.remove_connection(self.id);
        }
        self.connection.destroy();
    }

    /// Take the connection back out without releasing it.
    pub(crate) fn disarm(mut self) -> Option<LiveConnection> {
        let slot = self.slot.take()?;
        Some(LiveConnection {
            slot,
            connection: Arc::clone(&self.connection),
        })
    }
}

impl Deref for PoolConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl Drop for PoolConnection {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.release(LiveConnection {
                slot,
                connection: Arc::clone(&self.connection),
            });
        }
    }
}

impl fmt::Debug for PoolConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConnection")
            .field("id", &self.id)
            .field("driver", &self.connection.driver_name())
            .field("attached", &self.is_attached())
            .finish()
    }
}
