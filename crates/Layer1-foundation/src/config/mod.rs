//! Config - store configuration
//!
//! - `store.rs` - `StoreConfig` (root, layout, timeouts, commit identity)

mod store;

pub use store::{StoreConfig, StoreSettings};
