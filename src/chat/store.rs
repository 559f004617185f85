//! In-memory conversation store.
//!
//! The store is the single source of truth for what the front end renders.
//! It only ever grows; the one in-place mutation is resolving a placeholder.
//! Every mutation is published to subscribers so they can re-render.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{Message, MessageId};

/// Capacity of the change-event channel; slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 64;

/// Change published after each mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreEvent {
    /// A message was added at the end.
    Appended(MessageId),
    /// A message's text was replaced in place.
    Replaced(MessageId),
}

impl StoreEvent {
    /// Id of the message that changed.
    #[must_use]
    pub const fn id(self) -> MessageId {
        match self {
            Self::Appended(id) | Self::Replaced(id) => id,
        }
    }
}

/// Ordered, shared conversation. Clones share the same messages.
#[derive(Clone)]
pub struct ConversationStore {
    messages: Arc<RwLock<Vec<Message>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    /// Create a store seeded with the welcome message.
    #[must_use]
    pub fn with_welcome() -> Self {
        let store = Self::new();
        store.append(Message::welcome());
        store
    }

    /// Subscribe to change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Add a message at the end.
    pub fn append(&self, message: Message) {
        let id = message.id;
        self.write().push(message);
        debug!(%id, "Appended message");
        self.publish(StoreEvent::Appended(id));
    }

    /// Replace the text of the message with `id`, resolving it if pending.
    ///
    /// Returns `false` and leaves the store untouched if no message matches.
    #[must_use]
    pub fn replace(&self, id: MessageId, text: impl Into<String>) -> bool {
        let text = text.into();
        let found = self
            .write()
            .iter_mut()
            .find(|m| m.id == id)
            .map(|message| {
                message.text = text;
                message.pending = false;
            })
            .is_some();
        if !found {
            debug!(%id, "Replace target not found");
            return false;
        }
        debug!(%id, "Replaced message text");
        self.publish(StoreEvent::Replaced(id));
        true
    }

    /// Snapshot of all messages in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.read().clone()
    }

    /// Copy of the message with `id`.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.read().iter().find(|m| m.id == id).cloned()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of placeholders still waiting for a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.read().iter().filter(|m| m.pending).count()
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Message>> {
        self.messages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Message>> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }
}
