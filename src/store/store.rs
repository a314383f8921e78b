use super::observer::Observer;
use crate::error::StoreError;
use crate::State;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

type SliceObservers = HashMap<String, Vec<Observer<Value>>>;

/// An observable key-value store.
///
/// The state is a JSON object held behind an `Arc`. Every update installs a
/// fresh snapshot, so a snapshot returned by [`Store::get_state`] never
/// changes underneath its holder.
///
/// Observers come in two tiers:
/// - whole-state subscribers, notified on every update with the new state;
/// - slice observers, notified with the value of one key, only when that key
///   appears in the update.
///
/// Notification is synchronous. Subscribers always run before slice
/// observers, each tier in registration order.
///
/// # Examples
///
/// ```
/// use slicestore::{create_store, json};
/// use std::sync::{Arc, Mutex};
///
/// let store = create_store(None);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let seen_clone = seen.clone();
/// store.on("a", move |value| seen_clone.lock().unwrap().push(value.clone()));
///
/// store.set_state_json(json!({ "a": "b" }), false).unwrap();
/// store.set_state_json(json!({ "c": "d" }), false).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec![json!("b")]);
/// assert_eq!(store.get("c"), Some(json!("d")));
/// ```
pub struct Store {
    state: Arc<RwLock<Arc<State>>>,
    subscribers: Arc<RwLock<Vec<Observer<State>>>>,
    slice_observers: Arc<RwLock<SliceObservers>>,
}

// Critical sections only swap or clone data, so a poisoned lock still guards
// a consistent value.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Store {
    /// Create a store with an empty state.
    pub fn new() -> Self {
        Self::with_state(State::new())
    }

    /// Create a store with the given initial state.
    pub fn with_state(initial: State) -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(initial))),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            slice_observers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store from an untyped JSON value, which must be an object.
    pub fn from_json(initial: Value) -> Result<Self, StoreError> {
        match initial {
            Value::Object(state) => Ok(Self::with_state(state)),
            other => Err(StoreError::not_an_object(&other)),
        }
    }

    /// Get the current state snapshot.
    ///
    /// Cheap: only the `Arc` is cloned. Later updates replace the snapshot
    /// rather than mutating it.
    pub fn get_state(&self) -> Arc<State> {
        Arc::clone(&read_lock(&self.state))
    }

    /// Get a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        read_lock(&self.state).get(key).cloned()
    }

    /// Read the current state with a function.
    ///
    /// No lock is held while `f` runs, so it may update the store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&State) -> R,
    {
        let state = self.get_state();
        f(&state)
    }

    /// Shallow-merge `update` into the current state and notify observers.
    ///
    /// Keys in `update` replace the current values wholesale; other keys are
    /// kept. Every subscriber is notified with the new state, then every
    /// slice observer registered on a key of `update`, in `update`'s key
    /// order.
    ///
    /// Observers may call back into the store. Such a nested update runs its
    /// full notification pass before this one continues. A panicking
    /// observer aborts the rest of the pass; the new state stays installed.
    pub fn set_state(&self, update: State) {
        self.commit(update, false);
    }

    /// Replace the whole state with `update` and notify observers.
    ///
    /// Keys absent from `update` are dropped. Notification follows the same
    /// order as [`Store::set_state`].
    pub fn overwrite_state(&self, update: State) {
        self.commit(update, true);
    }

    /// Update the store from an untyped JSON value.
    ///
    /// Merges when `overwrite` is false, replaces otherwise. A value that is
    /// not an object is rejected before the state changes or any observer
    /// runs.
    pub fn set_state_json(&self, update: Value, overwrite: bool) -> Result<(), StoreError> {
        match update {
            Value::Object(update) => {
                self.commit(update, overwrite);
                Ok(())
            }
            other => Err(StoreError::not_an_object(&other)),
        }
    }

    /// Subscribe to every state change.
    pub fn subscribe<F>(&self, on_change: F)
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.add_subscriber(Observer::new(on_change));
    }

    /// Subscribe to every state change with a separate side-effect handler.
    ///
    /// `on_effect` runs right after `on_change`, with the same state.
    pub fn subscribe_with_effect<F, E>(&self, on_change: F, on_effect: E)
    where
        F: Fn(&State) + Send + Sync + 'static,
        E: Fn(&State) + Send + Sync + 'static,
    {
        self.add_subscriber(Observer::with_effect(on_change, on_effect));
    }

    /// Observe a single key.
    ///
    /// The callback receives the key's new value whenever an update contains
    /// that key. The key does not need to exist yet.
    pub fn on<F>(&self, key: impl Into<String>, on_change: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.add_slice_observer(key.into(), Observer::new(on_change));
    }

    /// Observe a single key with a separate side-effect handler.
    pub fn on_with_effect<F, E>(&self, key: impl Into<String>, on_change: F, on_effect: E)
    where
        F: Fn(&Value) + Send + Sync + 'static,
        E: Fn(&Value) + Send + Sync + 'static,
    {
        self.add_slice_observer(key.into(), Observer::with_effect(on_change, on_effect));
    }

    /// Number of whole-state subscribers.
    pub fn subscriber_count(&self) -> usize {
        read_lock(&self.subscribers).len()
    }

    /// Number of observers registered on `key`.
    pub fn slice_observer_count(&self, key: &str) -> usize {
        read_lock(&self.slice_observers)
            .get(key)
            .map_or(0, Vec::len)
    }

    fn add_subscriber(&self, observer: Observer<State>) {
        let mut subscribers = write_lock(&self.subscribers);
        subscribers.push(observer);
        trace!(subscribers = subscribers.len(), "registered subscriber");
    }

    fn add_slice_observer(&self, key: String, observer: Observer<Value>) {
        let mut slices = write_lock(&self.slice_observers);
        let observers = slices.entry(key).or_default();
        observers.push(observer);
        trace!(observers = observers.len(), "registered slice observer");
    }

    /// Install the next state, then run both notification phases.
    fn commit(&self, update: State, overwrite: bool) {
        debug!(keys = update.len(), overwrite, "committing state update");

        // Observers registered from inside a callback wait for the next pass.
        let subscribers = read_lock(&self.subscribers).clone();
        let slices: Vec<(String, Vec<Observer<Value>>)> = {
            let registered = read_lock(&self.slice_observers);
            update
                .keys()
                .filter_map(|key| {
                    registered
                        .get(key)
                        .map(|observers| (key.clone(), observers.clone()))
                })
                .collect()
        };

        let next = {
            let mut state = write_lock(&self.state);
            let next = if overwrite {
                Arc::new(update)
            } else {
                let mut merged = State::clone(&state);
                merged.extend(update);
                Arc::new(merged)
            };
            *state = Arc::clone(&next);
            next
        };

        for subscriber in &subscribers {
            subscriber.notify(&next);
        }

        for (key, observers) in &slices {
            // Every key of the update is present in the next state.
            let value = &next[key];
            trace!(key = %key, observers = observers.len(), "notifying slice observers");
            for observer in observers {
                observer.notify(value);
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
            slice_observers: Arc::clone(&self.slice_observers),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.get_state())
            .field("subscriber_count", &self.subscriber_count())
            .field("observed_keys", &read_lock(&self.slice_observers).len())
            .finish()
    }
}

/// Create a new store, optionally seeded with an initial state.
///
/// # Example
///
/// ```
/// use slicestore::{create_store, json, State};
///
/// let empty = create_store(None);
/// assert!(empty.get_state().is_empty());
///
/// let mut initial = State::new();
/// initial.insert("ready".to_string(), json!(true));
/// let seeded = create_store(initial);
/// assert_eq!(seeded.get("ready"), Some(json!(true)));
/// ```
pub fn create_store(initial: impl Into<Option<State>>) -> Store {
    Store::with_state(initial.into().unwrap_or_default())
}
