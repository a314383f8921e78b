//! # Slicestore
//!
//! A minimal observable key-value store for Rust.
//!
//! Callers change state through a single update operation and registered
//! observers are notified synchronously, before the update returns.
//!
//! ## State
//!
//! - [`State`] - a JSON object (`serde_json::Map`) keyed by string
//! - Updates are shallow: top-level keys are merged or replaced wholesale
//! - Each update installs a new snapshot; old snapshots never change
//!
//! ## Observers
//!
//! - Subscribers ([`Store::subscribe`]) see the whole state on every update
//! - Slice observers ([`Store::on`]) see one key's value, only when an
//!   update contains that key
//! - Subscribers run first, then slice observers, each in registration order
//!
//! ```
//! use slicestore::{create_store, json};
//!
//! let store = create_store(None);
//! store.subscribe(|state| println!("state: {state:?}"));
//! store.on("a", |value| println!("a: {value}"));
//!
//! store.set_state_json(json!({ "a": "b" }), false).unwrap();
//! assert_eq!(store.get("a"), Some(json!("b")));
//! ```

pub mod error;
pub mod store;

// Re-export main types for convenience
pub use error::StoreError;
pub use serde_json::{json, Value};
pub use store::{create_store, Store};

/// The state held by a [`Store`]: string keys mapped to JSON values, in
/// insertion order.
pub type State = serde_json::Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = create_store(None);
        assert!(store.get_state().is_empty());
        store.set_state_json(json!({ "answer": 42 }), false).unwrap();
        assert_eq!(store.get("answer"), Some(json!(42)));
    }
}
