use frag_kv::KvError;
use frag_types::{FragmentId, OwnerId};
use thiserror::Error;

/// Errors from fragment store operations.
///
/// `DataNotFound`, `OrphanedContent` and `PartialWriteFailure` describe
/// drift between the metadata and content backends rather than caller
/// mistakes; the store logs them before returning.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The declared media type is not in the type policy.
    #[error("unsupported fragment type: {fragment_type}")]
    UnsupportedType { fragment_type: String },

    /// No fragment exists for (owner, id).
    #[error("fragment not found: {owner}/{id}")]
    NotFound { owner: OwnerId, id: FragmentId },

    /// Metadata exists but the content blob is missing.
    #[error("fragment data not found: {owner}/{id}")]
    DataNotFound { owner: OwnerId, id: FragmentId },

    /// Content was removed but no matching metadata existed.
    #[error("orphaned content removed without metadata: {owner}/{id}")]
    OrphanedContent { owner: OwnerId, id: FragmentId },

    /// Metadata was persisted but the content write failed.
    #[error("partial write for {owner}/{id}: metadata stored, content failed")]
    PartialWriteFailure {
        owner: OwnerId,
        id: FragmentId,
        #[source]
        source: KvError,
    },

    /// The requested extension has no MIME type mapping.
    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    /// The fragment's type cannot be served as the requested type.
    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Every drawn fragment id was already in use.
    #[error("no unused fragment id for {owner} after {attempts} attempts")]
    IdsExhausted { owner: OwnerId, attempts: u32 },

    /// The underlying storage call failed.
    #[error("backend error: {0}")]
    Backend(#[from] KvError),

    /// Configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
