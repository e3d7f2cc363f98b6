//! Navigation state store.
//!
//! Holds the single live [`NavigationState`]. Updates are copy-on-write: a
//! mutator edits a draft clone, the draft is compared structurally against the
//! current state, and only a differing draft is committed and announced.

use std::sync::{Arc, Mutex, Weak};

use crate::error::Result;
use crate::state::NavigationState;

/// Change listener; invoked synchronously after each committed change. The
/// store's lock is not held while it runs, so it may subscribe or unsubscribe.
pub type Listener = Box<dyn FnMut(&NavigationState) + Send>;

#[derive(Default)]
struct ListenerSlots {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
    /// Listeners taken out for the dispatch in progress, if any.
    dispatching: Option<Vec<u64>>,
    /// Unsubscribed while their listener was out for dispatch.
    removed: Vec<u64>,
}

impl ListenerSlots {
    fn remove(&mut self, id: u64) {
        let in_flight = self
            .dispatching
            .as_ref()
            .is_some_and(|ids| ids.contains(&id));
        if in_flight {
            self.removed.push(id);
        } else {
            self.entries.retain(|(entry, _)| *entry != id);
        }
    }

    fn len(&self) -> usize {
        let in_flight = self.dispatching.as_ref().map_or(0, Vec::len);
        self.entries.len() + in_flight - self.removed.len()
    }
}

/// Handle returned by [`NavigationStore::subscribe`].
pub struct Subscription {
    id: u64,
    slots: Weak<Mutex<ListenerSlots>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(slots) = self.slots.upgrade() {
            if let Ok(mut guard) = slots.lock() {
                guard.remove(self.id);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifyOptions {
    /// Compute the candidate without committing it.
    pub dry_run: bool,
}

impl ModifyOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Result of [`NavigationStore::modify`].
#[derive(Debug, Clone)]
pub struct Modification {
    pub changed: bool,
    pub state: NavigationState,
}

pub struct NavigationStore {
    state: NavigationState,
    listeners: Arc<Mutex<ListenerSlots>>,
}

impl NavigationStore {
    pub fn new(state: NavigationState) -> Self {
        Self {
            state,
            listeners: Arc::new(Mutex::new(ListenerSlots::default())),
        }
    }

    pub fn get(&self) -> &NavigationState {
        &self.state
    }

    /// Replace the state unconditionally and notify subscribers.
    pub fn set(&mut self, state: NavigationState) {
        self.state = state;
        self.notify();
    }

    /// Replace the state only if it differs structurally; reports whether it did.
    pub fn commit(&mut self, candidate: NavigationState) -> bool {
        if candidate == self.state {
            return false;
        }
        self.set(candidate);
        true
    }

    /// Run `edit` against a draft of the current state. A failed edit leaves
    /// the store untouched; a dry run never commits.
    pub fn modify<F>(&mut self, edit: F, options: ModifyOptions) -> Result<Modification>
    where
        F: FnOnce(&mut NavigationState) -> Result<()>,
    {
        let mut draft = self.state.clone();
        edit(&mut draft)?;
        let changed = draft != self.state;
        if changed && !options.dry_run {
            self.set(draft.clone());
        }
        Ok(Modification {
            changed,
            state: draft,
        })
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&NavigationState) + Send + 'static,
    {
        let mut id = 0;
        if let Ok(mut guard) = self.listeners.lock() {
            id = guard.next_id;
            guard.next_id += 1;
            guard.entries.push((id, Box::new(listener)));
        }
        Subscription {
            id,
            slots: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    fn notify(&self) {
        let mut taken = {
            let Ok(mut guard) = self.listeners.lock() else {
                return;
            };
            let taken = std::mem::take(&mut guard.entries);
            guard.dispatching = Some(taken.iter().map(|(id, _)| *id).collect());
            taken
        };

        for (_, listener) in taken.iter_mut() {
            listener(&self.state);
        }

        if let Ok(mut guard) = self.listeners.lock() {
            let removed = std::mem::take(&mut guard.removed);
            guard.dispatching = None;
            taken.retain(|(id, _)| !removed.contains(id));
            let added = std::mem::replace(&mut guard.entries, taken);
            guard.entries.extend(added);
        }
    }
}
