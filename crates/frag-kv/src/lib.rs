//! Partitioned key/value backends.
//!
//! A backend maps `(partition key, sort key)` to a single value and can
//! list the sort keys under a partition. The fragment store uses two
//! independent instances: one holding metadata records, one holding raw
//! content. They may live in different physical stores and fail
//! independently.
//!
//! # Backends
//!
//! All backends implement the [`KvBackend`] trait:
//!
//! - [`InMemoryKv`] -- `HashMap`-based store for tests and embedding
//! - [`FileKv`] -- one file per value under a root directory, written via
//!   temp file + rename so each put is atomic
//!
//! # Design Rules
//!
//! 1. Every operation is individually atomic and safe to call concurrently.
//! 2. Backends are typed: a metadata backend never hands back raw bytes.
//! 3. Keys are validated identically by every backend.
//! 4. I/O and decoding errors are propagated, never silently ignored.

pub mod codec;
pub mod error;
pub mod file;
pub mod keys;
pub mod memory;
pub mod traits;

pub use codec::{BlobCodec, JsonCodec, ValueCodec};
pub use error::{KvError, KvResult};
pub use file::{BlobFileKv, FileKv, JsonFileKv};
pub use keys::{validate_key, MAX_KEY_LEN};
pub use memory::InMemoryKv;
pub use traits::KvBackend;
