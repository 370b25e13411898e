use crate::error::ReplicationError;
use crate::net::ParticipantId;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    EntityAttached {
        entity_id: u32,
        owned: bool,
    },
    EntityDespawned {
        entity_id: u32,
    },
    ChannelMismatch {
        entity_id: u32,
        sequence: u32,
        error: ReplicationError,
    },
    ParticipantDisconnected {
        participant: ParticipantId,
    },
}

impl ReplicationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationEvent::EntityAttached { .. } => "entity attached",
            ReplicationEvent::EntityDespawned { .. } => "entity despawned",
            ReplicationEvent::ChannelMismatch { .. } => "channel mismatch",
            ReplicationEvent::ParticipantDisconnected { .. } => "participant disconnected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Handlers run synchronously, in registration order.
pub struct Subscribers<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
    next_id: u64,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.handlers.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false when the handle was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn publish(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
