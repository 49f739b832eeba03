use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use frag_types::{ExtensionTable, TypePolicy};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Which physical stores back the metadata and content tiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Both tiers in process memory; contents are lost on exit.
    Memory,
    /// Both tiers on disk: `<root>/metadata` (JSON) and `<root>/content` (blobs).
    Filesystem { root: PathBuf },
}

/// Store configuration, built once at process start.
///
/// ```toml
/// id_attempts = 8
/// allowed_types = ["text/plain", "text/markdown"]
///
/// [backend]
/// kind = "filesystem"
/// root = "/var/lib/fragments"
///
/// [extensions]
/// rst = "text/prs.fallenstein.rst"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Attempts at drawing an unused fragment id before giving up.
    pub id_attempts: u32,
    /// Replaces the default type policy when set.
    pub allowed_types: Option<Vec<String>>,
    pub backend: BackendConfig,
    /// Extension mappings merged over the defaults.
    pub extensions: BTreeMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_attempts: 8,
            allowed_types: None,
            backend: BackendConfig::Memory,
            extensions: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Use a filesystem backend rooted at `root`, whatever was configured.
    pub fn with_data_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.backend = BackendConfig::Filesystem { root: root.into() };
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.id_attempts == 0 {
            return Err(StoreError::Config("id_attempts must be at least 1".into()));
        }
        if let Some(types) = &self.allowed_types {
            if TypePolicy::from_types(types).is_empty() {
                return Err(StoreError::Config("allowed_types is empty".into()));
            }
        }
        if let BackendConfig::Filesystem { root } = &self.backend {
            if root.as_os_str().is_empty() {
                return Err(StoreError::Config("filesystem root is empty".into()));
            }
        }
        Ok(())
    }

    pub fn type_policy(&self) -> TypePolicy {
        match &self.allowed_types {
            Some(types) => TypePolicy::from_types(types),
            None => TypePolicy::default(),
        }
    }

    pub fn extension_table(&self) -> ExtensionTable {
        ExtensionTable::default().with_overrides(&self.extensions)
    }
}
