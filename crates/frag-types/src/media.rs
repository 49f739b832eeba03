//! Media type helpers and the read-time extension table.

use std::collections::BTreeMap;

/// Canonical markdown media type.
pub const MARKDOWN: &str = "text/markdown";
/// Non-standard markdown alias accepted alongside [`MARKDOWN`].
pub const MARKDOWN_ALIAS: &str = "text/md";
/// HTML media type, the only conversion target.
pub const HTML: &str = "text/html";

/// Strip any `;parameter=value` suffix from a declared media type.
///
/// `"text/plain; charset=utf-8"` becomes `"text/plain"`. Surrounding
/// whitespace is trimmed; case is preserved.
pub fn bare_type(declared: &str) -> &str {
    declared.split(';').next().unwrap_or_default().trim()
}

/// Whether a bare media type denotes markdown.
pub fn is_markdown(bare: &str) -> bool {
    bare.eq_ignore_ascii_case(MARKDOWN) || bare.eq_ignore_ascii_case(MARKDOWN_ALIAS)
}

/// Extension mappings used when no overrides are configured.
///
/// `.md` and `.markdown` are listed explicitly; platform MIME databases
/// frequently lack them.
pub const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("md", MARKDOWN),
    ("markdown", MARKDOWN),
    ("html", HTML),
    ("htm", HTML),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("xml", "text/xml"),
    ("rtf", "text/rtf"),
    ("ics", "text/calendar"),
    ("vcf", "text/vcard"),
    ("vtt", "text/vtt"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
];

/// Static extension → bare MIME type table.
///
/// Keys are stored lowercase without the leading dot. The table is plain
/// data: construct it from [`DEFAULT_EXTENSIONS`] and layer configured
/// overrides on top with [`ExtensionTable::with_overrides`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionTable {
    entries: BTreeMap<String, String>,
}

impl ExtensionTable {
    /// Build a table from explicit `(extension, mime)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(ext, mime)| (normalize_extension(ext), mime.to_string()))
            .collect();
        Self { entries }
    }

    /// Merge additional mappings, replacing any existing entry for the same extension.
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (ext, mime) in overrides {
            self.entries
                .insert(normalize_extension(ext.as_ref()), mime.into());
        }
        self
    }

    /// Resolve an extension (with or without the leading dot) to a bare MIME type.
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.entries
            .get(&normalize_extension(extension))
            .map(|mime| bare_type(mime))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_EXTENSIONS.iter().copied())
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}
