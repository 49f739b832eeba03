use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use frag_kv::{BlobFileKv, InMemoryKv, JsonFileKv, KvBackend};
use frag_render::{FormatConverter, StandardConverter};
use frag_types::{ExtensionTable, Fragment, FragmentId, OwnerId, TypePolicy};
use tracing::{debug, error, warn};

use crate::config::{BackendConfig, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// Backend holding serialized fragment metadata.
pub type MetadataBackend = dyn KvBackend<Fragment>;
/// Backend holding raw fragment content.
pub type ContentBackend = dyn KvBackend<Vec<u8>>;

type IdSource = dyn Fn() -> FragmentId + Send + Sync;

/// Fragment content served in a requested representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub data: Vec<u8>,
    /// Bare type of the stored fragment.
    pub source_type: String,
    /// Bare type of `data`.
    pub target_type: String,
}

/// Keeps fragment metadata and content consistent across two backends.
///
/// Each `(owner, id)` is either absent from both backends or present in
/// both. The two backends fail independently and there is no transaction
/// spanning them, so writes and deletes are sequential two-phase
/// operations; a failure between phases leaves a partial state that is
/// reported to the caller ([`StoreError::PartialWriteFailure`],
/// [`StoreError::DataNotFound`], [`StoreError::OrphanedContent`]) and
/// never repaired silently.
///
/// The store holds no locks of its own. Every call is synchronous and
/// relies on the backends for per-operation atomicity; concurrent writes
/// to the same fragment are last-write-wins.
pub struct FragmentStore {
    metadata: Arc<MetadataBackend>,
    content: Arc<ContentBackend>,
    policy: TypePolicy,
    extensions: ExtensionTable,
    converter: Arc<dyn FormatConverter>,
    id_source: Arc<IdSource>,
    id_attempts: u32,
}

impl FragmentStore {
    /// A store over the given backends with the default policy, extension
    /// table and converter.
    pub fn new(metadata: Arc<MetadataBackend>, content: Arc<ContentBackend>) -> Self {
        Self {
            metadata,
            content,
            policy: TypePolicy::default(),
            extensions: ExtensionTable::default(),
            converter: Arc::new(StandardConverter),
            id_source: Arc::new(FragmentId::generate),
            id_attempts: StoreConfig::default().id_attempts,
        }
    }

    /// A fresh store with both tiers in memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryKv::<Fragment>::new()),
            Arc::new(InMemoryKv::<Vec<u8>>::new()),
        )
    }

    /// Build the backends, policy and extension table described by `config`.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let store = match &config.backend {
            BackendConfig::Memory => Self::in_memory(),
            BackendConfig::Filesystem { root } => {
                let metadata = JsonFileKv::<Fragment>::open_json(root.join("metadata"))?;
                let content = BlobFileKv::open_blob(root.join("content"))?;
                Self::new(Arc::new(metadata), Arc::new(content))
            }
        };
        Ok(store
            .with_policy(config.type_policy())
            .with_extensions(config.extension_table())
            .with_id_attempts(config.id_attempts))
    }

    pub fn with_policy(mut self, policy: TypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_extensions(mut self, extensions: ExtensionTable) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn FormatConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Replace the id generator used by [`generate_id`](Self::generate_id).
    ///
    /// The source must yield opaque ids; uniqueness is still checked
    /// against the metadata backend.
    pub fn with_id_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> FragmentId + Send + Sync + 'static,
    {
        self.id_source = Arc::new(source);
        self
    }

    pub fn with_id_attempts(mut self, attempts: u32) -> Self {
        self.id_attempts = attempts.max(1);
        self
    }

    pub fn policy(&self) -> &TypePolicy {
        &self.policy
    }

    pub fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    /// Whether the type policy accepts `declared` (parameters allowed).
    pub fn is_supported_type(&self, declared: &str) -> bool {
        self.policy.is_supported(declared)
    }

    // ---- Identifiers ----

    /// A fragment id not currently used by `owner`.
    ///
    /// Ids are opaque (UUID v7 by default), so concurrent creators for the
    /// same owner do not collide. An id already present in the metadata
    /// backend is re-drawn, up to the configured attempt limit.
    pub fn generate_id(&self, owner: &OwnerId) -> StoreResult<FragmentId> {
        for _ in 0..self.id_attempts {
            let id = (self.id_source)();
            if !self.metadata.contains(owner.as_str(), id.as_str())? {
                return Ok(id);
            }
            warn!(owner = owner.short(), id = %id, "generated fragment id already in use");
        }
        Err(StoreError::IdsExhausted {
            owner: owner.clone(),
            attempts: self.id_attempts,
        })
    }

    // ---- Writes ----

    /// Create a new fragment for `owner` from a declared type and content.
    pub fn create(
        &self,
        owner: &OwnerId,
        fragment_type: &str,
        data: &[u8],
    ) -> StoreResult<Fragment> {
        self.ensure_supported(fragment_type)?;
        let id = self.generate_id(owner)?;
        let fragment = Fragment::new(id, owner.clone(), fragment_type);
        let now = fragment.created;
        self.write_at(fragment, data, now)
    }

    /// Replace the content and declared type of an existing fragment.
    ///
    /// `id`, owner and `created` are kept. The new type goes through the
    /// same policy check as a write.
    pub fn update(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        fragment_type: &str,
        data: &[u8],
    ) -> StoreResult<Fragment> {
        let mut existing = self.read(owner, id)?.ok_or_else(|| StoreError::NotFound {
            owner: owner.clone(),
            id: id.clone(),
        })?;
        existing.fragment_type = fragment_type.to_string();
        self.write(existing, data)
    }

    /// Persist `fragment` and its content.
    ///
    /// The type is checked against the policy before anything is written.
    /// `updated` is set once, at the start of the operation, and `size` is
    /// set to `data.len()` before the metadata is stored. Metadata is
    /// written first, then content; if the content write fails the
    /// metadata stays behind and [`StoreError::PartialWriteFailure`] is
    /// returned.
    pub fn write(&self, fragment: Fragment, data: &[u8]) -> StoreResult<Fragment> {
        self.write_at(fragment, data, Utc::now())
    }

    fn write_at(
        &self,
        mut fragment: Fragment,
        data: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Fragment> {
        self.ensure_supported(&fragment.fragment_type)?;

        let owner = fragment.owner_id.clone();
        let id = fragment.id.clone();
        fragment.updated = now;
        fragment.size = data.len() as u64;

        self.metadata.put(owner.as_str(), id.as_str(), &fragment)?;

        if let Err(source) = self.content.put(owner.as_str(), id.as_str(), &data.to_vec()) {
            error!(
                owner = owner.short(),
                id = %id,
                error = %source,
                "fragment metadata stored but content write failed"
            );
            return Err(StoreError::PartialWriteFailure { owner, id, source });
        }

        debug!(
            owner = owner.short(),
            id = %id,
            fragment_type = %fragment.fragment_type,
            size = fragment.size,
            "fragment written"
        );
        Ok(fragment)
    }

    // ---- Reads ----

    /// Read a fragment's metadata. `Ok(None)` if it does not exist.
    pub fn read(&self, owner: &OwnerId, id: &FragmentId) -> StoreResult<Option<Fragment>> {
        let fragment = self.metadata.get(owner.as_str(), id.as_str())?;
        if fragment.is_none() {
            debug!(owner = owner.short(), id = %id, "fragment metadata not found");
        }
        Ok(fragment)
    }

    /// Read a fragment's raw content.
    ///
    /// Returns [`StoreError::DataNotFound`] when metadata exists without
    /// content, and [`StoreError::NotFound`] when neither exists.
    pub fn read_content(&self, owner: &OwnerId, id: &FragmentId) -> StoreResult<Vec<u8>> {
        if let Some(data) = self.content.get(owner.as_str(), id.as_str())? {
            return Ok(data);
        }
        if self.metadata.contains(owner.as_str(), id.as_str())? {
            warn!(owner = owner.short(), id = %id, "fragment metadata present but content missing");
            return Err(StoreError::DataNotFound {
                owner: owner.clone(),
                id: id.clone(),
            });
        }
        Err(StoreError::NotFound {
            owner: owner.clone(),
            id: id.clone(),
        })
    }

    /// Read a fragment's content in the representation named by `extension`.
    ///
    /// The extension (with or without a leading dot) is resolved first, so
    /// an unknown extension fails the same way for every fragment.
    pub fn convert(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        extension: &str,
    ) -> StoreResult<Rendered> {
        let target = self
            .extensions
            .lookup(extension)
            .ok_or_else(|| StoreError::UnknownExtension(extension.to_string()))?
            .to_string();

        let fragment = self.read(owner, id)?.ok_or_else(|| StoreError::NotFound {
            owner: owner.clone(),
            id: id.clone(),
        })?;
        let data = self.read_content(owner, id)?;

        let source = fragment.mime_type().to_string();
        if !fragment.supports_format(&target) {
            return Err(StoreError::UnsupportedConversion {
                from: source,
                to: target,
            });
        }

        let data = self.converter.convert(&source, &data, &target);
        Ok(Rendered {
            data,
            source_type: source,
            target_type: target,
        })
    }

    // ---- Listing ----

    /// Ids of every fragment `owner` has, sorted. Empty if none.
    pub fn list(&self, owner: &OwnerId) -> StoreResult<Vec<FragmentId>> {
        let mut ids: Vec<FragmentId> = self
            .metadata
            .list_sort_keys(owner.as_str())?
            .into_iter()
            .filter_map(|key| match FragmentId::new(key) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(owner = owner.short(), error = %e, "skipping unusable fragment key");
                    None
                }
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Metadata of every fragment `owner` has.
    ///
    /// An id that cannot be read back (deleted concurrently, or a record
    /// the backend fails to return) is skipped and logged, so the result
    /// may be shorter than [`list`](Self::list). Only a failure to list
    /// the owner's ids is returned.
    pub fn list_expanded(&self, owner: &OwnerId) -> StoreResult<Vec<Fragment>> {
        let ids = self.list(owner)?;
        let mut fragments = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read(owner, &id) {
                Ok(Some(fragment)) => fragments.push(fragment),
                Ok(None) => {
                    warn!(owner = owner.short(), id = %id, "listed fragment vanished before read")
                }
                Err(e) => {
                    warn!(owner = owner.short(), id = %id, error = %e, "skipping unreadable fragment")
                }
            }
        }
        Ok(fragments)
    }

    // ---- Deletes ----

    /// Delete a fragment's content, then its metadata.
    ///
    /// Missing content fails with [`StoreError::NotFound`] and leaves any
    /// metadata untouched. Content removed without matching metadata fails
    /// with [`StoreError::OrphanedContent`]. Only a fragment present in
    /// both backends is deleted successfully.
    pub fn delete(&self, owner: &OwnerId, id: &FragmentId) -> StoreResult<()> {
        if !self.content.delete(owner.as_str(), id.as_str())? {
            if self.metadata.contains(owner.as_str(), id.as_str())? {
                error!(
                    owner = owner.short(),
                    id = %id,
                    "delete found metadata without content; metadata left in place"
                );
            }
            return Err(StoreError::NotFound {
                owner: owner.clone(),
                id: id.clone(),
            });
        }

        if !self.metadata.delete(owner.as_str(), id.as_str())? {
            error!(
                owner = owner.short(),
                id = %id,
                "deleted fragment content that had no metadata"
            );
            return Err(StoreError::OrphanedContent {
                owner: owner.clone(),
                id: id.clone(),
            });
        }

        debug!(owner = owner.short(), id = %id, "fragment deleted");
        Ok(())
    }

    fn ensure_supported(&self, fragment_type: &str) -> StoreResult<()> {
        if self.policy.is_supported(fragment_type) {
            return Ok(());
        }
        debug!(fragment_type, "rejected unsupported fragment type");
        Err(StoreError::UnsupportedType {
            fragment_type: fragment_type.to_string(),
        })
    }
}

impl fmt::Debug for FragmentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentStore")
            .field("metadata", &self.metadata.backend_name())
            .field("content", &self.content.backend_name())
            .field("allowed_types", &self.policy.len())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
