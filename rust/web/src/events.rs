use cardcrew_engine::events::{Audience, GameEvent, Notification};
use cardcrew_engine::session::SessionId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

// Bounded per connection; a client that falls this far behind is dropped
const EVENT_CHANNEL_BUFFER: usize = 256;

pub type ConnectionId = String;
pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// Receiving end for one live connection. Dropping it unregisters the
/// connection and takes it out of every room.
pub struct ConnectionEvents {
    bus: EventBus,
    connection_id: ConnectionId,
    pub receiver: EventReceiver,
}

impl ConnectionEvents {
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }
}

impl Drop for ConnectionEvents {
    fn drop(&mut self) {
        self.bus.unregister(&self.connection_id);
    }
}

/// Routes engine notifications to websocket connections: directly by
/// connection id, or to every connection that joined a session's room.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    connections: RwLock<HashMap<ConnectionId, EventSender>>,
    rooms: RwLock<HashMap<SessionId, HashSet<ConnectionId>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection_id: ConnectionId) -> ConnectionEvents {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        self.write_connections().insert(connection_id.clone(), tx);

        tracing::debug!(connection_id = %connection_id, "connection registered");

        ConnectionEvents {
            bus: self.clone(),
            connection_id,
            receiver: rx,
        }
    }

    pub fn unregister(&self, connection_id: &str) {
        let removed = self.write_connections().remove(connection_id).is_some();
        self.leave_all(connection_id);
        if removed {
            tracing::debug!(connection_id = %connection_id, "connection unregistered");
        }
    }

    /// Adds a connection to a room. Joining twice is harmless.
    pub fn join_room(&self, session_id: &SessionId, connection_id: &str) {
        let inserted = self
            .write_rooms()
            .entry(session_id.clone())
            .or_default()
            .insert(connection_id.to_string());
        if inserted {
            tracing::debug!(
                session_id = %session_id,
                connection_id = %connection_id,
                "connection joined room"
            );
        }
    }

    pub fn leave_all(&self, connection_id: &str) {
        let mut rooms = self.write_rooms();
        for members in rooms.values_mut() {
            members.remove(connection_id);
        }
        rooms.retain(|_, members| !members.is_empty());
    }

    pub fn dispatch(&self, notification: Notification) {
        match notification.audience {
            Audience::Room(session_id) => self.broadcast(&session_id, notification.event),
            Audience::Connection(connection_id) => {
                self.send_to(&connection_id, notification.event)
            }
        }
    }

    pub fn broadcast(&self, session_id: &SessionId, event: GameEvent) {
        let targets: Vec<(ConnectionId, EventSender)> = {
            let rooms = self.read_rooms();
            let connections = self.read_connections();
            rooms
                .get(session_id)
                .map(|members| {
                    members
                        .iter()
                        .filter_map(|id| connections.get(id).map(|tx| (id.clone(), tx.clone())))
                        .collect()
                })
                .unwrap_or_default()
        };

        tracing::trace!(
            session_id = %session_id,
            event = event.name(),
            recipients = targets.len(),
            "broadcasting event"
        );

        let mut failed = Vec::new();
        for (id, sender) in targets {
            if let Err(err) = sender.try_send(event.clone()) {
                tracing::warn!(
                    session_id = %session_id,
                    connection_id = %id,
                    error = %err,
                    "dropping connection that cannot take events"
                );
                failed.push(id);
            }
        }
        for id in failed {
            self.unregister(&id);
        }
    }

    pub fn send_to(&self, connection_id: &str, event: GameEvent) {
        let sender = self.read_connections().get(connection_id).cloned();
        let Some(sender) = sender else {
            tracing::debug!(
                connection_id = %connection_id,
                event = event.name(),
                "no live connection for event"
            );
            return;
        };
        if let Err(err) = sender.try_send(event) {
            tracing::warn!(
                connection_id = %connection_id,
                error = %err,
                "dropping connection that cannot take events"
            );
            self.unregister(connection_id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.read_connections().len()
    }

    pub fn room_size(&self, session_id: &str) -> usize {
        self.read_rooms().get(session_id).map_or(0, HashSet::len)
    }

    fn read_connections(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, EventSender>> {
        self.inner
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_connections(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, EventSender>> {
        self.inner
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_rooms(&self) -> RwLockReadGuard<'_, HashMap<SessionId, HashSet<ConnectionId>>> {
        self.inner
            .rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rooms(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, HashSet<ConnectionId>>> {
        self.inner
            .rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
