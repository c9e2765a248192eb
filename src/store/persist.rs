//! Stores that survive restarts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Reducer, StateStorage, Store, SubscriptionId};
use crate::error::StoreError;

/// Versioned envelope written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Snapshot format version
    pub version: u32,
    /// Persisted state
    pub state: T,
}

/// A [`Store`] whose state is written to a [`StateStorage`] after every transition.
///
/// Write failures are logged and do not roll the transition back; the
/// in-memory state stays authoritative.
pub struct PersistedStore<R, S>
where
    R: Reducer + Serialize + DeserializeOwned + Default,
    S: StateStorage,
{
    store: Store<R>,
    storage: S,
    key: &'static str,
    version: u32,
}

impl<R, S> PersistedStore<R, S>
where
    R: Reducer + Serialize + DeserializeOwned + Default,
    S: StateStorage,
{
    /// Snapshot version written by this build.
    pub const DEFAULT_VERSION: u32 = 1;

    /// Open a store under `key`, rehydrating from storage when possible.
    ///
    /// A missing, unreadable or incompatible snapshot starts from the
    /// default state.
    pub fn open(storage: S, key: &'static str) -> Self {
        Self::open_versioned(storage, key, Self::DEFAULT_VERSION)
    }

    /// Like [`open`](Self::open) with an explicit snapshot version.
    pub fn open_versioned(storage: S, key: &'static str, version: u32) -> Self {
        let state = match Self::load(&storage, key, version) {
            Ok(Some(state)) => {
                log::info!("Restored '{}' from storage", key);
                state
            }
            Ok(None) => {
                log::debug!("No stored state for '{}'", key);
                R::default()
            }
            Err(e) => {
                log::warn!("Failed to restore '{}': {}", key, e);
                R::default()
            }
        };

        Self {
            store: Store::new(state),
            storage,
            key,
            version,
        }
    }

    fn load(storage: &S, key: &str, version: u32) -> Result<Option<R>, StoreError> {
        let Some(json) = storage.get_item(key)? else {
            return Ok(None);
        };
        let snapshot: Snapshot<R> = serde_json::from_str(&json)?;
        if snapshot.version > version {
            return Err(StoreError::VersionTooNew {
                key: key.to_string(),
                found: snapshot.version,
                supported: version,
            });
        }
        Ok(Some(snapshot.state))
    }

    /// Current state.
    pub fn state(&self) -> &R {
        self.store.state()
    }

    /// Register a listener called after every transition.
    pub fn subscribe(&mut self, listener: impl FnMut(&R) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Storage key.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply an action, then persist the new state.
    pub fn dispatch(&mut self, action: R::Action) {
        self.store.dispatch(action);
        if let Err(e) = self.persist() {
            log::warn!("Failed to persist '{}': {}", self.key, e);
        }
    }

    /// Replace the whole state, then persist it.
    pub fn replace(&mut self, state: R) {
        self.store.replace(state);
        if let Err(e) = self.persist() {
            log::warn!("Failed to persist '{}': {}", self.key, e);
        }
    }

    /// Write the current state to storage.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            version: self.version,
            state: self.store.state(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.storage.set_item(self.key, &json)
    }

    /// Drop the stored snapshot and reset to the default state.
    pub fn purge(&mut self) -> Result<(), StoreError> {
        self.storage.remove_item(self.key)?;
        self.store.replace(R::default());
        Ok(())
    }

    /// Consume the store, returning the storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Notes {
        items: Vec<String>,
    }

    #[derive(Debug)]
    struct Push(String);

    impl Reducer for Notes {
        type Action = Push;

        fn reduce(&mut self, action: Push) {
            self.items.push(action.0);
        }
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut store = PersistedStore::<Notes, _>::open(MemoryStorage::new(), "notes");
        store.dispatch(Push("a".into()));
        store.dispatch(Push("b".into()));

        let reopened = PersistedStore::<Notes, _>::open(store.into_storage(), "notes");
        assert_eq!(reopened.state().items, vec!["a", "b"]);
    }

    #[test]
    fn test_corrupt_snapshot_starts_fresh() {
        let mut storage = MemoryStorage::new();
        storage.set_item("notes", "not json").unwrap();
        let store = PersistedStore::<Notes, _>::open(storage, "notes");
        assert!(store.state().items.is_empty());
    }

    #[test]
    fn test_newer_snapshot_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item("notes", r#"{"version":9,"state":{"items":["x"]}}"#)
            .unwrap();
        let store = PersistedStore::<Notes, _>::open(storage, "notes");
        assert!(store.state().items.is_empty());
    }

    #[test]
    fn test_replace_persists_and_notifies() {
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut store = PersistedStore::<Notes, _>::open(MemoryStorage::new(), "notes");
        let counter = seen.clone();
        let id = store.subscribe(move |_| counter.set(counter.get() + 1));

        store.replace(Notes {
            items: vec!["z".into()],
        });
        assert_eq!(seen.get(), 1);
        assert!(store.unsubscribe(id));
        store.dispatch(Push("y".into()));
        assert_eq!(seen.get(), 1);

        let reopened = PersistedStore::<Notes, _>::open(store.into_storage(), "notes");
        assert_eq!(reopened.state().items, vec!["z", "y"]);
    }

    #[test]
    fn test_purge() {
        let mut store = PersistedStore::<Notes, _>::open(MemoryStorage::new(), "notes");
        store.dispatch(Push("a".into()));
        store.purge().unwrap();
        assert!(store.state().items.is_empty());
        assert_eq!(store.storage().get_item("notes").unwrap(), None);
    }
}
