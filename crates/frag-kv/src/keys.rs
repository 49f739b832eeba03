use crate::error::{KvError, KvResult};

/// Longest accepted key in bytes. Leaves room under the usual 255-byte
/// file name limit for the extension a file backend appends.
pub const MAX_KEY_LEN: usize = 240;

/// Validate a partition or sort key.
///
/// Keys become path components in file-backed stores, so the rules are
/// those of a single safe file name: non-empty, at most [`MAX_KEY_LEN`]
/// bytes, no path separators or NUL, no leading `.`.
pub fn validate_key(kind: &'static str, key: &str) -> KvResult<()> {
    let reject = |reason| {
        Err(KvError::InvalidKey {
            kind,
            key: key.to_string(),
            reason,
        })
    };

    if key.is_empty() {
        return reject("empty");
    }
    if key.len() > MAX_KEY_LEN {
        return reject("too long");
    }
    if key.starts_with('.') {
        return reject("leading '.'");
    }
    if key.contains(['/', '\\', '\0']) {
        return reject("contains a path separator or NUL");
    }
    Ok(())
}

pub(crate) fn validate_pair(partition: &str, sort: &str) -> KvResult<()> {
    validate_key("partition", partition)?;
    validate_key("sort", sort)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_keys() {
        assert!(validate_key("sort", "0190f5b2-7c1e-7d43-9a2b-3f7c1c0a5e11").is_ok());
        assert!(validate_key("partition", "a1b2c3").is_ok());
        assert!(validate_key("sort", "notes.v2").is_ok());
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for bad in ["", ".", "..", ".hidden", "a/b", "a\\b", "a\0b"] {
            let err = validate_key("sort", bad).unwrap_err();
            assert!(matches!(err, KvError::InvalidKey { .. }), "{bad:?} accepted");
        }
    }

    #[test]
    fn rejects_overlong_keys() {
        let long = "k".repeat(MAX_KEY_LEN + 1);
        assert!(validate_key("partition", &long).is_err());
        assert!(validate_key("partition", &long[..MAX_KEY_LEN]).is_ok());
    }
}
