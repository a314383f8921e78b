//! Observable key-value state.
//!
//! A [`Store`] holds a JSON object and notifies two tiers of observers on
//! every update: whole-state subscribers first, then observers registered
//! on the individual keys the update touched.

mod observer;
mod store;

pub use store::{create_store, Store};
