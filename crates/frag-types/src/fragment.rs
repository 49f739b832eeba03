use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{FragmentId, OwnerId};
use crate::media::{bare_type, is_markdown, HTML, MARKDOWN, MARKDOWN_ALIAS};

/// Metadata record describing one stored fragment.
///
/// A `Fragment` is a plain value: it owns no backend resources and is
/// read and discarded per request. Field names in the serialized form are
/// fixed (`id`, `ownerId`, `created`, `updated`, `fragmentType`, `size`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    /// Unique within the owner's namespace; immutable after creation.
    pub id: FragmentId,
    pub owner_id: OwnerId,
    /// Set once, at first write.
    pub created: DateTime<Utc>,
    /// Set on every content mutation.
    pub updated: DateTime<Utc>,
    /// Full declared media type, parameters included.
    pub fragment_type: String,
    /// Byte length of the stored content.
    pub size: u64,
}

impl Fragment {
    /// A new, not yet persisted fragment with `created == updated == now`.
    pub fn new(id: FragmentId, owner_id: OwnerId, fragment_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            created: now,
            updated: now,
            fragment_type: fragment_type.into(),
            size: 0,
        }
    }

    /// The declared type without parameters.
    pub fn mime_type(&self) -> &str {
        bare_type(&self.fragment_type)
    }

    pub fn is_markdown(&self) -> bool {
        is_markdown(self.mime_type())
    }

    /// Bare MIME types this fragment can be served as.
    ///
    /// Markdown may be served as itself (under either alias) or as HTML;
    /// every other type only as itself.
    pub fn formats(&self) -> Vec<String> {
        if self.is_markdown() {
            vec![HTML.to_string(), MARKDOWN.to_string(), MARKDOWN_ALIAS.to_string()]
        } else {
            vec![self.mime_type().to_string()]
        }
    }

    /// Whether [`formats`](Self::formats) contains `target` (compared case-insensitively).
    pub fn supports_format(&self, target: &str) -> bool {
        let target = bare_type(target);
        self.formats()
            .iter()
            .any(|format| format.eq_ignore_ascii_case(target))
    }

    /// Serialize the record as JSON.
    pub fn to_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(fragment_type: &str) -> Fragment {
        Fragment::new(
            FragmentId::new("frag-1").unwrap(),
            OwnerId::new("owner-1").unwrap(),
            fragment_type,
        )
    }

    #[test]
    fn new_fragment_has_matching_timestamps() {
        let frag = fragment("text/plain");
        assert_eq!(frag.created, frag.updated);
        assert_eq!(frag.size, 0);
    }

    #[test]
    fn mime_type_drops_parameters() {
        assert_eq!(fragment("text/plain; charset=utf-8").mime_type(), "text/plain");
        assert_eq!(fragment("text/markdown").mime_type(), "text/markdown");
    }

    #[test]
    fn markdown_formats() {
        let formats = fragment("text/markdown; charset=utf-8").formats();
        assert_eq!(formats.len(), 3);
        assert!(formats.contains(&"text/html".to_string()));
        assert!(formats.contains(&"text/markdown".to_string()));
        assert!(formats.contains(&"text/md".to_string()));

        assert_eq!(fragment("text/md").formats().len(), 3);
    }

    #[test]
    fn other_types_only_format_as_themselves() {
        let frag = fragment("application/json; charset=utf-8");
        assert_eq!(frag.formats(), vec!["application/json".to_string()]);
        assert!(frag.supports_format("application/json"));
        assert!(!frag.supports_format("text/html"));
    }

    #[test]
    fn json_uses_stable_field_names() {
        let frag = fragment("text/plain");
        let value: serde_json::Value = serde_json::from_str(&frag.to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["created", "fragmentType", "id", "ownerId", "size", "updated"]
        );
        assert_eq!(obj["ownerId"], "owner-1");
        assert_eq!(obj["fragmentType"], "text/plain");
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let mut frag = fragment("text/csv");
        frag.size = 42;
        let back = Fragment::from_json(&frag.to_json().unwrap()).unwrap();
        assert_eq!(back, frag);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = Fragment::from_json("{\"id\": 3}").unwrap_err();
        assert!(matches!(err, TypeError::Serialization(_)));
    }
}
