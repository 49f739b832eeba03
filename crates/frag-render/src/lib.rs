//! Read-time format conversion.
//!
//! Conversion happens only when a fragment is read and its result is
//! never stored. Whether a `(source, target)` pair is allowed is decided
//! by the caller from [`Fragment::formats`](frag_types::Fragment::formats)
//! before a converter is invoked, so converters never report an
//! unsupported pair.

pub mod converter;
pub mod markdown;

pub use converter::{FormatConverter, StandardConverter};
pub use markdown::markdown_to_html;
