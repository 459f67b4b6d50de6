use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use log::*;
use tokio::sync::mpsc;

use crate::{
    db_types::UserId,
    fanout::{NotificationEvent, RoomKey},
};

pub type ConnectionId = u64;

const DEFAULT_QUEUE_DEPTH: usize = 64;

struct Registry {
    next_id: AtomicU64,
    queue_depth: usize,
    /// Senders for every live connection, keyed by connection id. A connection's entry is removed on disconnect, or
    /// lazily when a publish finds its receiver gone.
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<NotificationEvent>>>,
    /// Room membership. Membership is session-scoped: nothing here survives a disconnect, and a reconnecting client
    /// must join its rooms again.
    rooms: Mutex<HashMap<RoomKey, HashMap<ConnectionId, mpsc::Sender<NotificationEvent>>>>,
}

/// The notification fan-out service: a process-wide registry of connections and the rooms they have joined.
///
/// Cloning the service clones a handle to the same registry. All locking is internal and never held across an await
/// point; publishing uses non-blocking sends into bounded per-connection queues, so one slow member cannot hold up
/// delivery to the rest of a room.
#[derive(Clone)]
pub struct FanoutService {
    registry: Arc<Registry>,
}

impl Default for FanoutService {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl std::fmt::Debug for FanoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FanoutService")
    }
}

impl FanoutService {
    /// `queue_depth` bounds each connection's pending-event queue. When a queue is full, new events for that
    /// connection are dropped; delivery is best-effort by contract.
    pub fn new(queue_depth: usize) -> Self {
        let registry = Registry {
            next_id: AtomicU64::new(1),
            queue_depth: queue_depth.max(1),
            connections: Mutex::new(HashMap::new()),
            rooms: Mutex::new(HashMap::new()),
        };
        Self { registry: Arc::new(registry) }
    }

    /// Register a new connection and hand back its event receiver. The connection belongs to no rooms until it
    /// joins some.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<NotificationEvent>) {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.registry.queue_depth);
        self.lock_connections().insert(id, tx);
        debug!("📬️ Connection {id} registered");
        (id, rx)
    }

    /// Join the caller's own user room. Idempotent: joining a room twice is a no-op.
    pub fn join_user_room(&self, conn: ConnectionId, user_id: &UserId) {
        self.join(conn, RoomKey::User(user_id.clone()));
    }

    /// Join a supplier room. Idempotent. Only suppliers have a reason to be here; the caller's identity was
    /// validated out-of-band at connect time.
    pub fn join_supplier_room(&self, conn: ConnectionId, supplier_id: &UserId) {
        self.join(conn, RoomKey::Supplier(supplier_id.clone()));
    }

    fn join(&self, conn: ConnectionId, room: RoomKey) {
        let sender = match self.lock_connections().get(&conn) {
            Some(tx) => tx.clone(),
            None => {
                warn!("📬️ Unknown connection {conn} tried to join room {room}; ignoring");
                return;
            },
        };
        let mut rooms = self.lock_rooms();
        let members = rooms.entry(room).or_default();
        members.entry(conn).or_insert(sender);
    }

    /// Remove the connection and every room membership it holds. Events already queued for other members are
    /// unaffected.
    pub fn disconnect(&self, conn: ConnectionId) {
        self.lock_connections().remove(&conn);
        let mut rooms = self.lock_rooms();
        for members in rooms.values_mut() {
            members.remove(&conn);
        }
        rooms.retain(|_, members| !members.is_empty());
        debug!("📬️ Connection {conn} deregistered");
    }

    /// Deliver an event to every currently-connected member of the room. At-most-once: members with a full queue or
    /// a dropped receiver miss the event, and closed connections are pruned as they are found. Returns the number of
    /// queues the event landed in.
    pub fn publish(&self, room: &RoomKey, event: &NotificationEvent) -> usize {
        let mut rooms = self.lock_rooms();
        let Some(members) = rooms.get_mut(room) else {
            trace!("📬️ No members in room {room}; {} event dropped", event.event_type);
            return 0;
        };
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (conn, sender) in members.iter() {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("📬️ Queue full for connection {conn} in room {room}; {} event dropped", event.event_type);
                },
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*conn),
            }
        }
        for conn in closed {
            members.remove(&conn);
            self.lock_connections().remove(&conn);
            trace!("📬️ Pruned closed connection {conn} from room {room}");
        }
        trace!("📬️ Published {} to {delivered} member(s) of {room}", event.event_type);
        delivered
    }

    // Lock poisoning can only arise from a panic inside one of these short critical sections; recovering the inner
    // map keeps the service degraded-but-alive rather than poisoning every future publish.
    fn lock_connections(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<NotificationEvent>>> {
        self.registry.connections.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rooms(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<RoomKey, HashMap<ConnectionId, mpsc::Sender<NotificationEvent>>>> {
        self.registry.rooms.lock().unwrap_or_else(|e| e.into_inner())
    }
}
