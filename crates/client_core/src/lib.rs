//! Client-side access to work orders.
//!
//! Consumers talk to a [`WorkOrderStore`] through a [`WorkOrderController`],
//! which keeps the last-known-good collection plus loading and error state.
//! The store may be the in-memory fake, the HTTP client for the server, or a
//! local SQLite [`storage::Storage`]; the CRUD contract is the same for all three.

pub mod controller;
pub mod error;
mod local;
pub mod preferences;
pub mod store;
pub mod transport;
pub mod view;

pub use controller::{ControllerSnapshot, WorkOrderController};
pub use error::StoreError;
pub use preferences::{PreferenceStore, Preferences};
pub use store::{InMemoryWorkOrderStore, WorkOrderStore, DEFAULT_SIMULATED_LATENCY};
pub use transport::HttpWorkOrderStore;
pub use view::{apply_preferences, page_count, WorkOrderStats};
