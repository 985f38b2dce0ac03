//! Events emitted by the engine after each state change.
//!
//! Each event names the affected node and carries an id-only snapshot of the
//! full `TreeState`, so a renderer can diff against its previous frame.

use std::fmt;

use serde::Serialize;

use crate::domain::TreeStateSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeEventKind {
    NodeExpand,
    NodeCollapse,
    NodeSelect,
    NodeCheck,
    NodeAdd,
    NodeRemove,
    /// A node was reparented by drag-and-drop
    NodeDrop,
    /// Lazy children arrived
    NodeLoad,
    NodeLoadFailed,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEvent {
    pub kind: TreeEventKind,
    /// `None` only for `Search`
    pub node_id: Option<String>,
    pub state: TreeStateSnapshot,
}

/// Handle returned by `EventBus::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&TreeEvent)>;

/// Synchronous fan-out to subscribed listeners, plus a queue for callers
/// that prefer to poll.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    queue: Vec<TreeEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: TreeEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        self.queue.push(event);
    }

    /// Take every event emitted since the last drain.
    pub fn drain(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.queue)
    }
}
