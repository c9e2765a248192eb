//! Explicit state containers.
//!
//! Every store in the crate is a plain state struct implementing [`Reducer`]:
//! one action in, one complete state transition out. [`Store`] owns such a
//! state and notifies subscribers after each transition, so observers never
//! see a half-applied action. [`PersistedStore`] additionally writes a
//! versioned snapshot to a [`StateStorage`] backend.
//!
//! Stores are constructed by the caller and passed to whatever needs them;
//! there are no process-wide singletons.

mod history;
mod persist;
mod storage;

pub use history::{HistoryConfig, SnapshotHistory};
pub use persist::{PersistedStore, Snapshot};
pub use storage::{FileStorage, MemoryStorage, StateStorage};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;

/// A state that evolves through discrete actions.
pub trait Reducer {
    /// Actions accepted by this state.
    type Action: std::fmt::Debug;

    /// Apply one action. The whole transition happens inside this call.
    fn reduce(&mut self, action: Self::Action);
}

/// Identifier returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<R> = Box<dyn FnMut(&R)>;

/// Owner of a reducer state.
///
/// Mutations are synchronous and last-writer-wins. Listeners run after each
/// completed transition with the new state.
pub struct Store<R: Reducer> {
    state: R,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener<R>)>,
    next_subscription: u64,
}

impl<R: Reducer + Default> Default for Store<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: Reducer> Store<R> {
    /// Create a store holding the given initial state.
    pub fn new(state: R) -> Self {
        Self {
            state,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &R {
        &self.state
    }

    /// Number of transitions applied since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply an action and notify listeners.
    pub fn dispatch(&mut self, action: R::Action) {
        log::trace!("Store: dispatch {:?}", action);
        self.state.reduce(action);
        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Replace the whole state in one transition (used for rehydration).
    pub fn replace(&mut self, state: R) {
        self.state = state;
        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Register a listener called after every transition.
    pub fn subscribe(&mut self, listener: impl FnMut(&R) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Consume the store, returning the state.
    pub fn into_state(self) -> R {
        self.state
    }
}

impl<R: Reducer + std::fmt::Debug> std::fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
