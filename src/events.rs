//! Named session events and the listener registry.
//!
//! Listeners are plain callbacks invoked on the session's driver task, in
//! registration order. Ordinary listeners run before one-shot listeners
//! registered for the same event.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::message::Message;

/// Something that happened on a session.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A connection was established.
    Open,
    /// A connection ended, for whatever reason.
    Close,
    /// The server accepted our credentials.
    Auth,
    /// A line arrived; carries the decoded message.
    Message(Message),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Open => EventKind::Open,
            Event::Close => EventKind::Close,
            Event::Auth => EventKind::Auth,
            Event::Message(_) => EventKind::Message,
        }
    }
}

/// The name listeners subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Auth,
    Message,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Auth => "auth",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown event name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown event: {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(EventKind::Open),
            "close" => Ok(EventKind::Close),
            "auth" => Ok(EventKind::Auth),
            "message" => Ok(EventKind::Message),
            other => Err(UnknownEvent(other.to_owned())),
        }
    }
}

/// Handle returned on registration, used to remove the listener again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

type Entries = Vec<(ListenerId, Listener)>;

#[derive(Default)]
struct Registry {
    ordinary: HashMap<EventKind, Entries>,
    once: HashMap<EventKind, Entries>,
}

#[derive(Default)]
pub struct EventEmitter {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a listener for every future `kind` event.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry
            .lock()
            .ordinary
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Register a listener for the next `kind` event only.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry
            .lock()
            .once
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        let Registry { ordinary, once } = &mut *registry;
        for entries in ordinary.values_mut().chain(once.values_mut()) {
            if let Some(pos) = entries.iter().position(|(entry, _)| *entry == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut registry = self.registry.lock();
        registry.ordinary.clear();
        registry.once.clear();
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let registry = self.registry.lock();
        registry.ordinary.get(&kind).map_or(0, Vec::len)
            + registry.once.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to its listeners.
    ///
    /// Works on a snapshot taken before the first call, so listeners may
    /// register or remove listeners (including themselves) while running.
    /// Changes take effect from the next emission. One-shot listeners are
    /// removed before they run.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        let (ordinary, once) = {
            let mut registry = self.registry.lock();
            let ordinary = registry.ordinary.get(&kind).cloned().unwrap_or_default();
            let once = registry.once.remove(&kind).unwrap_or_default();
            (ordinary, once)
        };

        for (_, listener) in ordinary.iter().chain(once.iter()) {
            listener(event);
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventEmitter")
            .field("ordinary", &registry.ordinary.values().map(Vec::len).sum::<usize>())
            .field("once", &registry.once.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
