//! Logging every change to a store.
//!
//! Run with `RUST_LOG=slicestore=trace` to also see the store's own events.

use slicestore::{create_store, json, StoreError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Slicestore ===\n");

    let store = create_store(None);

    store.subscribe(|state| println!("state: {}", json!(state)));
    store.on("a", |value| println!("  a changed to {value}"));
    store.on_with_effect(
        "c",
        |value| println!("  c changed to {value}"),
        |_| println!("  (c effect ran)"),
    );

    println!("1. Setting a:");
    store.set_state_json(json!({ "a": "b" }), false)?;

    println!("\n2. Setting c:");
    store.set_state_json(json!({ "c": "d" }), false)?;

    println!("\n3. Setting a again:");
    store.set_state_json(json!({ "a": "foo" }), false)?;

    println!("\n4. Overwriting:");
    store.set_state_json(json!({ "z": 1 }), true)?;

    println!("\n5. Rejected update:");
    if let Err(err) = store.set_state_json(json!("not an object"), false) {
        println!("  error: {err}");
    }

    println!("\nFinal state: {}", json!(*store.get_state()));
    Ok(())
}
