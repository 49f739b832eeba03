use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

fn validate(kind: &'static str, value: &str) -> Result<(), TypeError> {
    if value.trim().is_empty() {
        return Err(TypeError::EmptyIdentifier { kind });
    }
    if value.chars().any(char::is_control) {
        return Err(TypeError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason: "contains control characters",
        });
    }
    Ok(())
}

/// Opaque identifier of the principal that owns a set of fragments.
///
/// The store never derives or resolves owners; whatever produced the id
/// must produce the same one for the same user on every call.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate("owner", &value)?;
        Ok(Self(value))
    }

    /// Derive an owner id from a raw username (BLAKE3, hex-encoded).
    ///
    /// Callers that authenticate users use this so raw usernames never
    /// reach a storage backend.
    pub fn from_username(username: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"frag-owner-v1:");
        hasher.update(username.as_bytes());
        Self(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (first 8 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.short())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a fragment, unique within its owner's namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(String);

impl FragmentId {
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate("fragment", &value)?;
        Ok(Self(value))
    }

    /// A fresh opaque identifier (UUID v7, hyphenated).
    ///
    /// Safe under concurrent creation for the same owner; carries no
    /// ordering guarantee callers should rely on.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FragmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
