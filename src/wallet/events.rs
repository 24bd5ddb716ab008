//! Typed adapter events and the listener registry behind `on`/`off`.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event delivered to adapter listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Connected { address: String },
    Disconnected,
}

impl AdapterEvent {
    pub fn kind(&self) -> AdapterEventKind {
        match self {
            Self::Connected { .. } => AdapterEventKind::Connect,
            Self::Disconnected => AdapterEventKind::Disconnect,
        }
    }
}

/// Event name a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterEventKind {
    Connect,
    Disconnect,
}

/// Opaque handle returned by `on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Arc<dyn Fn(&AdapterEvent) + Send + Sync>;

/// Ordered listeners per event kind.
///
/// Registering the same closure twice yields two handles and two deliveries.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: DashMap<AdapterEventKind, Vec<(SubscriptionId, Listener)>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("connect", &self.count(AdapterEventKind::Connect))
            .field("disconnect", &self.count(AdapterEventKind::Disconnect))
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: AdapterEventKind, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.entry(kind).or_default().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, kind: AdapterEventKind, id: SubscriptionId) -> bool {
        let Some(mut entries) = self.listeners.get_mut(&kind) else {
            return false;
        };
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to its listeners in registration order.
    pub fn emit(&self, event: &AdapterEvent) {
        // Snapshot first: listeners may subscribe or unsubscribe re-entrantly.
        let snapshot: Vec<Listener> = match self.listeners.get(&event.kind()) {
            Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn count(&self, kind: AdapterEventKind) -> usize {
        self.listeners.get(&kind).map(|e| e.len()).unwrap_or(0)
    }
}
