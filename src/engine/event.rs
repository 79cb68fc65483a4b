//! Change listeners
//!
//! Each action owns a [`ListenerList`]. Dispatch always walks a copy of the list taken
//! before the first call, so adding or removing listeners only affects later ticks.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

use crate::engine::Player;
use crate::mapping::{ActionId, Value};

/// What a listener receives when an action's value changes.
#[derive(Clone, Copy)]
pub struct ActionEvent<'a> {
    pub action: ActionId,
    pub player: &'a Player,
    pub value: Value,
}

/// The single capability a listener has.
pub trait ActionListener {
    fn on_change(&mut self, event: &ActionEvent<'_>);
}

impl<F> ActionListener for F
where
    F: FnMut(&ActionEvent<'_>),
{
    fn on_change(&mut self, event: &ActionEvent<'_>) {
        self(event)
    }
}

/// Handle returned on registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type SharedListener = Rc<RefCell<dyn ActionListener>>;

#[derive(Default)]
pub struct ListenerList {
    entries: Vec<(ListenerId, SharedListener)>,
    next_id: u64,
}

impl ListenerList {
    pub fn add<L: ActionListener + 'static>(&mut self, listener: L) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let listener: SharedListener = Rc::new(RefCell::new(listener));
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registration-ordered copy of the current listeners.
    pub(crate) fn snapshot(&self) -> Vec<SharedListener> {
        self.entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }
}

/// Calls every listener in order and returns how many were invoked.
pub(crate) fn dispatch(listeners: &[SharedListener], event: &ActionEvent<'_>) -> usize {
    let mut calls = 0;
    for listener in listeners {
        match listener.try_borrow_mut() {
            Ok(mut listener) => {
                listener.on_change(event);
                calls += 1;
            }
            Err(_) => warn!("Listener for {} is already running, skipped", event.action),
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Rc<Cell<usize>>);

    impl ActionListener for Counter {
        fn on_change(&mut self, _event: &ActionEvent<'_>) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn remove_only_hits_matching_id() {
        let hits = Rc::new(Cell::new(0));
        let mut list = ListenerList::default();
        let a = list.add(Counter(Rc::clone(&hits)));
        let b = list.add(Counter(Rc::clone(&hits)));
        assert!(list.remove(a));
        assert!(!list.remove(a));
        assert_eq!(list.len(), 1);
        assert!(list.remove(b));
        assert!(list.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let hits = Rc::new(Cell::new(0));
        let mut list = ListenerList::default();
        let id = list.add(Counter(Rc::clone(&hits)));

        let snapshot = list.snapshot();
        list.remove(id);
        assert_eq!(snapshot.len(), 1);
        assert!(list.snapshot().is_empty());
        assert_eq!(hits.get(), 0);
    }
}
