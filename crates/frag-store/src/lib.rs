//! The fragment store.
//!
//! Orchestrates reads, writes and deletes of user-owned fragments across
//! two independently failing key/value backends: one for metadata
//! records, one for raw content. Callers (an HTTP layer, the `frag` CLI)
//! authenticate a user, derive an [`OwnerId`](frag_types::OwnerId) and
//! call into [`FragmentStore`]; the store validates requests against the
//! type policy and reports partial states instead of hiding them.
//!
//! # Modules
//!
//! - [`config`] — [`StoreConfig`], loaded once at startup and injected
//! - [`error`] — [`StoreError`], one variant per failure kind
//! - [`store`] — [`FragmentStore`] and its [`Rendered`] read result

pub mod config;
pub mod error;
pub mod store;

#[cfg(test)]
mod faults;

pub use config::{BackendConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use store::{ContentBackend, FragmentStore, MetadataBackend, Rendered};
