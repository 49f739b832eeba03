//! Foundation types for the fragment store.
//!
//! A *fragment* is an opaque, user-owned byte blob plus a metadata record.
//! This crate holds the metadata model and the pure, backend-free rules
//! that surround it. Every other `frag-*` crate depends on `frag-types`.
//!
//! # Key Types
//!
//! - [`Fragment`] — The metadata record (identity, owner, timestamps, type, size)
//! - [`OwnerId`] / [`FragmentId`] — String newtypes addressing a fragment
//! - [`TypePolicy`] — Allow-list of storable bare MIME types
//! - [`ExtensionTable`] — Read-time extension → MIME type resolution

pub mod error;
pub mod fragment;
pub mod ids;
pub mod media;
pub mod policy;

pub use error::TypeError;
pub use fragment::Fragment;
pub use ids::{FragmentId, OwnerId};
pub use media::{
    bare_type, is_markdown, ExtensionTable, DEFAULT_EXTENSIONS, HTML, MARKDOWN, MARKDOWN_ALIAS,
};
pub use policy::{TypePolicy, DEFAULT_SUPPORTED_TYPES};
