//! Value encodings for file-backed stores.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{KvError, KvResult};

/// Converts values to and from their on-disk bytes.
pub trait ValueCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> KvResult<Vec<u8>>;

    /// Decode bytes read from `key` (used for error context only).
    fn decode(&self, key: &str, bytes: &[u8]) -> KvResult<V>;

    /// File extension for stored values, without the dot.
    fn extension(&self) -> &'static str;
}

/// Structured records as JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<V> ValueCodec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> KvResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| KvError::Serialization(e.to_string()))
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> KvResult<V> {
        serde_json::from_slice(bytes)
            .map_err(|e| KvError::Serialization(format!("{key}: {e}")))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

const BLOB_MAGIC: &[u8; 4] = b"FRG1";
const BLOB_HEADER: usize = 8;

/// Raw bytes framed with a CRC32 checksum.
///
/// On-disk format:
/// ```text
/// [4 bytes: magic "FRG1"]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload]
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobCodec;

impl ValueCodec<Vec<u8>> for BlobCodec {
    fn encode(&self, value: &Vec<u8>) -> KvResult<Vec<u8>> {
        let mut framed = Vec::with_capacity(BLOB_HEADER + value.len());
        framed.extend_from_slice(BLOB_MAGIC);
        framed.extend_from_slice(&crc32fast::hash(value).to_le_bytes());
        framed.extend_from_slice(value);
        Ok(framed)
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> KvResult<Vec<u8>> {
        let corrupt = |reason: String| KvError::Corrupt {
            key: key.to_string(),
            reason,
        };

        if bytes.len() < BLOB_HEADER {
            return Err(corrupt(format!("truncated header ({} bytes)", bytes.len())));
        }
        let (header, payload) = bytes.split_at(BLOB_HEADER);
        if &header[..4] != BLOB_MAGIC {
            return Err(corrupt("bad magic".into()));
        }
        let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let computed = crc32fast::hash(payload);
        if expected != computed {
            return Err(corrupt(format!(
                "checksum mismatch: expected {expected:08x}, computed {computed:08x}"
            )));
        }
        Ok(payload.to_vec())
    }

    fn extension(&self) -> &'static str {
        "blob"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn blob_frame_layout() {
        let framed = BlobCodec.encode(&b"abc".to_vec()).unwrap();
        assert_eq!(&framed[..4], b"FRG1");
        assert_eq!(framed.len(), BLOB_HEADER + 3);
        assert_eq!(BlobCodec.decode("k", &framed).unwrap(), b"abc".to_vec());
    }

    #[test]
    fn blob_detects_bit_flip() {
        let mut framed = BlobCodec.encode(&b"payload".to_vec()).unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0x01;
        let err = BlobCodec.decode("owner/id", &framed).unwrap_err();
        assert!(matches!(err, KvError::Corrupt { .. }), "got {err}");
    }

    #[test]
    fn blob_rejects_truncated_and_foreign_data() {
        assert!(BlobCodec.decode("k", b"FRG").is_err());
        assert!(BlobCodec.decode("k", b"XXXX\0\0\0\0").is_err());
    }

    #[test]
    fn empty_blob_is_valid() {
        let framed = BlobCodec.encode(&Vec::new()).unwrap();
        assert!(BlobCodec.decode("k", &framed).unwrap().is_empty());
    }

    #[test]
    fn json_codec_reports_decode_errors() {
        let codec = JsonCodec;
        let bytes = ValueCodec::<BTreeMap<String, u32>>::encode(&codec, &BTreeMap::from([
            ("a".to_string(), 1),
        ]))
        .unwrap();
        let back = ValueCodec::<BTreeMap<String, u32>>::decode(&codec, "k", &bytes).unwrap();
        assert_eq!(back["a"], 1);

        let err = ValueCodec::<BTreeMap<String, u32>>::decode(&codec, "k", b"not json").unwrap_err();
        assert!(matches!(err, KvError::Serialization(_)));
    }
}
