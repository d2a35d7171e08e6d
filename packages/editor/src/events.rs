//! Synchronous editor events.
//!
//! Listeners run on the caller's stack, in subscription order, before the
//! emitting method returns.

use crate::block::BlockId;

/// Something observable happened in the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Document content changed (mutation, undo/redo, load, new draft)
    Changed,

    /// Selection changed
    Selected { id: Option<BlockId> },

    /// An autosave was scheduled; the UI can show "saving…"
    SavingStarted,

    /// A draft write finished
    SaveCompleted { draft_id: String },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorEvent) + Send>;

/// Ordered observer list.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: EditorEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_listeners_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = log.clone();
        bus.subscribe(move |e| first.lock().unwrap().push(format!("1:{:?}", e)));
        let second = log.clone();
        bus.subscribe(move |e| second.lock().unwrap().push(format!("2:{:?}", e)));

        bus.emit(EditorEvent::Changed);

        assert_eq!(*log.lock().unwrap(), vec!["1:Changed", "2:Changed"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();

        let counter = count.clone();
        let id = bus.subscribe(move |_| *counter.lock().unwrap() += 1);

        bus.emit(EditorEvent::SavingStarted);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(EditorEvent::SavingStarted);

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.listener_count(), 0);
    }
}
