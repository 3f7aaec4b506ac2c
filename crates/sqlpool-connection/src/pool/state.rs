//! Pool internals protected by the pool mutex.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use sqlpool_core::{Connection, Result};
use tokio::sync::oneshot;

use super::connection::PoolConnection;
use super::events::ConnectionId;

/// A pending acquire request.
pub(crate) type Waiter = oneshot::Sender<Result<PoolConnection>>;

/// Whether a connection still belongs to its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attachment {
    Active,
    /// Administratively removed; must never be reused.
    Detached,
}

enum SlotStatus {
    Connecting,
    Ready(Arc<dyn Connection>),
    Failed,
}

/// The pool's record of one physical connection.
pub(crate) struct ConnectionSlot {
    id: ConnectionId,
    status: Mutex<SlotStatus>,
    attachment: Mutex<Attachment>,
}

impl ConnectionSlot {
    fn new(id: ConnectionId) -> Self {
        Self {
            id,
            status: Mutex::new(SlotStatus::Connecting),
            attachment: Mutex::new(Attachment::Active),
        }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    /// The established connection, if connect succeeded.
    pub(crate) fn connection(&self) -> Option<Arc<dyn Connection>> {
        match &*self.status.lock() {
            SlotStatus::Ready(conn) => Some(Arc::clone(conn)),
            SlotStatus::Connecting | SlotStatus::Failed => None,
        }
    }

    pub(crate) fn mark_ready(&self, connection: Arc<dyn Connection>) {
        *self.status.lock() = SlotStatus::Ready(connection);
    }

    pub(crate) fn mark_failed(&self) {
        *self.status.lock() = SlotStatus::Failed;
    }

    pub(crate) fn is_failed(&self) -> bool {
        matches!(*self.status.lock(), SlotStatus::Failed)
    }

    pub(crate) fn attachment(&self) -> Attachment {
        *self.attachment.lock()
    }

    pub(crate) fn detach(&self) {
        *self.attachment.lock() = Attachment::Detached;
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.attachment() == Attachment::Detached
    }
}

/// An established connection together with its slot.
#[derive(Clone)]
pub(crate) struct LiveConnection {
    pub(crate) slot: Arc<ConnectionSlot>,
    pub(crate) connection: Arc<dyn Connection>,
}

impl LiveConnection {
    pub(crate) fn id(&self) -> ConnectionId {
        self.slot.id()
    }
}

/// Every collection the admission state machine works on.
pub(crate) struct PoolState {
    /// Shutdown has begun. Never reverts.
    pub(crate) closed: bool,
    /// Every connection owned by the pool, in creation order.
    pub(crate) all: IndexMap<ConnectionId, Arc<ConnectionSlot>>,
    /// Connections free for reuse; always a subset of `all`.
    pub(crate) idle: VecDeque<LiveConnection>,
    /// Pending acquire requests in arrival order.
    pub(crate) waiters: VecDeque<Waiter>,
    next_id: u64,
}

impl PoolState {
    pub(crate) fn new() -> Self {
        Self {
            closed: false,
            all: IndexMap::new(),
            idle: VecDeque::new(),
            waiters: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Record a new connection that is about to connect.
    pub(crate) fn insert_slot(&mut self) -> Arc<ConnectionSlot> {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        let slot = Arc::new(ConnectionSlot::new(id));
        self.all.insert(id, Arc::clone(&slot));
        slot
    }

    /// Drop a connection from `all` and `idle`. No-op if absent.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<Arc<ConnectionSlot>> {
        self.idle.retain(|live| live.id() != id);
        self.all.shift_remove(&id)
    }

    /// Pop the oldest waiter whose caller is still listening.
    pub(crate) fn next_waiter(&mut self) -> Option<Waiter> {
        while let Some(waiter) = self.waiters.pop_front() {
            if !waiter.is_closed() {
                return Some(waiter);
            }
        }
        None
    }
}
