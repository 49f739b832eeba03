use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::codec::{BlobCodec, JsonCodec, ValueCodec};
use crate::error::KvResult;
use crate::keys::{validate_key, validate_pair};
use crate::traits::KvBackend;

/// File-backed partitioned store.
///
/// Layout: `<root>/<partition>/<sort>.<ext>`, one file per value, encoded
/// by the codec `C`. Writes go to a temp file in the partition directory
/// and are renamed into place, so readers never observe a half-written
/// value and concurrent puts to one key resolve to the last rename.
pub struct FileKv<V, C> {
    root: PathBuf,
    codec: C,
    _value: PhantomData<fn() -> V>,
}

/// Metadata records as JSON files.
pub type JsonFileKv<V> = FileKv<V, JsonCodec>;

/// Raw content as checksummed blob files.
pub type BlobFileKv = FileKv<Vec<u8>, BlobCodec>;

impl<V, C> FileKv<V, C>
where
    C: ValueCodec<V>,
{
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>, codec: C) -> KvResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), ext = codec.extension(), "opened file store");
        Ok(Self {
            root,
            codec,
            _value: PhantomData,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(partition)
    }

    fn value_path(&self, partition: &str, sort: &str) -> PathBuf {
        self.partition_dir(partition)
            .join(format!("{sort}.{}", self.codec.extension()))
    }

    /// A temp file inside `dir`, creating the directory as needed.
    ///
    /// A concurrent delete may prune the directory between creating it and
    /// opening the temp file, so that step is retried.
    fn temp_file_in(&self, dir: &Path) -> KvResult<NamedTempFile> {
        let mut attempts = 0;
        loop {
            fs::create_dir_all(dir)?;
            match NamedTempFile::new_in(dir) {
                Ok(tmp) => return Ok(tmp),
                Err(e) if e.kind() == io::ErrorKind::NotFound && attempts < 3 => attempts += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove a partition directory once its last value is gone.
    ///
    /// `remove_dir` only succeeds on an empty directory, so a partition
    /// that still holds values (or an in-flight temp file) is left alone.
    fn prune_partition(&self, partition: &str) {
        if fs::remove_dir(self.partition_dir(partition)).is_ok() {
            debug!(partition, "removed empty partition directory");
        }
    }
}

impl<V> JsonFileKv<V>
where
    JsonCodec: ValueCodec<V>,
{
    /// Open a JSON-encoded store at `root`.
    pub fn open_json(root: impl AsRef<Path>) -> KvResult<Self> {
        Self::open(root, JsonCodec)
    }
}

impl BlobFileKv {
    /// Open a checksummed blob store at `root`.
    pub fn open_blob(root: impl AsRef<Path>) -> KvResult<Self> {
        Self::open(root, BlobCodec)
    }
}

impl<V, C> KvBackend<V> for FileKv<V, C>
where
    C: ValueCodec<V>,
{
    fn put(&self, partition: &str, sort: &str, value: &V) -> KvResult<()> {
        validate_pair(partition, sort)?;
        let encoded = self.codec.encode(value)?;

        let dir = self.partition_dir(partition);
        let mut tmp = self.temp_file_in(&dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.value_path(partition, sort))
            .map_err(|e| e.error)?;
        Ok(())
    }

    fn get(&self, partition: &str, sort: &str) -> KvResult<Option<V>> {
        validate_pair(partition, sort)?;
        let path = self.value_path(partition, sort);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let key = format!("{partition}/{sort}");
        self.codec.decode(&key, &bytes).map(Some)
    }

    fn delete(&self, partition: &str, sort: &str) -> KvResult<bool> {
        validate_pair(partition, sort)?;
        match fs::remove_file(self.value_path(partition, sort)) {
            Ok(()) => {
                self.prune_partition(partition);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_sort_keys(&self, partition: &str) -> KvResult<Vec<String>> {
        validate_key("partition", partition)?;
        let entries = match fs::read_dir(self.partition_dir(partition)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", self.codec.extension());
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(partition, file = ?entry.file_name(), "skipping non UTF-8 file name");
                continue;
            };
            // Temp files from in-flight puts start with '.' and never match a valid key.
            if name.starts_with('.') {
                continue;
            }
            if let Some(sort) = name.strip_suffix(&suffix) {
                keys.push(sort.to_string());
            }
        }
        Ok(keys)
    }

    fn contains(&self, partition: &str, sort: &str) -> KvResult<bool> {
        validate_pair(partition, sort)?;
        match fs::metadata(self.value_path(partition, sort)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

impl<V, C> std::fmt::Debug for FileKv<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKv").field("root", &self.root).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::KvError;

    type Record = BTreeMap<String, String>;

    fn record(v: &str) -> Record {
        BTreeMap::from([("value".to_string(), v.to_string())])
    }

    fn temp_blobs() -> (tempfile::TempDir, BlobFileKv) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobFileKv::open_blob(dir.path().join("content")).unwrap();
        (dir, store)
    }

    #[test]
    fn blob_put_get_delete() {
        let (_dir, store) = temp_blobs();
        store.put("owner", "id1", &b"hello".to_vec()).unwrap();
        assert_eq!(store.get("owner", "id1").unwrap(), Some(b"hello".to_vec()));
        assert!(store.contains("owner", "id1").unwrap());

        assert!(store.delete("owner", "id1").unwrap());
        assert!(!store.delete("owner", "id1").unwrap());
        assert_eq!(store.get("owner", "id1").unwrap(), None);
        assert!(!store.contains("owner", "id1").unwrap());
    }

    #[test]
    fn json_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileKv::<Record>::open_json(dir.path()).unwrap();
            store.put("owner", "a", &record("first")).unwrap();
        }
        let store = JsonFileKv::<Record>::open_json(dir.path()).unwrap();
        assert_eq!(store.get("owner", "a").unwrap(), Some(record("first")));
    }

    #[test]
    fn files_use_partition_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKv::<Record>::open_json(dir.path()).unwrap();
        store.put("owner", "a", &record("x")).unwrap();
        assert!(dir.path().join("owner").join("a.json").is_file());
    }

    #[test]
    fn list_ignores_foreign_files() {
        let (dir, store) = temp_blobs();
        store.put("owner", "a", &vec![1]).unwrap();
        store.put("owner", "b", &vec![2]).unwrap();
        let partition = dir.path().join("content").join("owner");
        fs::write(partition.join("stray.txt"), b"x").unwrap();
        fs::write(partition.join(".tmpXYZ"), b"x").unwrap();
        fs::create_dir(partition.join("nested.blob")).unwrap();

        let mut keys = store.list_sort_keys("owner").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn list_missing_partition_is_empty() {
        let (_dir, store) = temp_blobs();
        assert!(store.list_sort_keys("nobody").unwrap().is_empty());
    }

    #[test]
    fn empty_partition_directories_are_removed() {
        let (dir, store) = temp_blobs();
        let partition = dir.path().join("content").join("owner");
        store.put("owner", "a", &vec![1]).unwrap();
        store.put("owner", "b", &vec![2]).unwrap();

        store.delete("owner", "a").unwrap();
        assert!(partition.is_dir());
        store.delete("owner", "b").unwrap();
        assert!(!partition.exists());
        assert!(store.list_sort_keys("owner").unwrap().is_empty());

        store.put("owner", "c", &vec![3]).unwrap();
        assert_eq!(store.get("owner", "c").unwrap(), Some(vec![3]));
    }

    #[test]
    fn overwrite_replaces_value() {
        let (_dir, store) = temp_blobs();
        store.put("owner", "a", &vec![1, 2, 3]).unwrap();
        store.put("owner", "a", &vec![9]).unwrap();
        assert_eq!(store.get("owner", "a").unwrap(), Some(vec![9]));
        assert_eq!(store.list_sort_keys("owner").unwrap().len(), 1);
    }

    #[test]
    fn tampered_blob_is_corrupt() {
        let (dir, store) = temp_blobs();
        store.put("owner", "a", &b"trustworthy".to_vec()).unwrap();
        let path = dir.path().join("content").join("owner").join("a.blob");
        let mut raw = fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        fs::write(&path, raw).unwrap();

        let err = store.get("owner", "a").unwrap_err();
        assert!(matches!(err, KvError::Corrupt { .. }), "got {err}");
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let (_dir, store) = temp_blobs();
        assert!(matches!(
            store.put("..", "a", &vec![]),
            Err(KvError::InvalidKey { .. })
        ));
        assert!(store.get("owner", "../../etc/passwd").is_err());
    }

    #[test]
    fn concurrent_puts_to_distinct_keys() {
        let (_dir, store) = temp_blobs();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..10 {
                        store.put("shared", &format!("{t}-{i}"), &vec![t, i]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.list_sort_keys("shared").unwrap().len(), 40);
        assert_eq!(store.get("shared", "3-9").unwrap(), Some(vec![3, 9]));
    }
}
