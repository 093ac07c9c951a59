//! Filesystem-backed cache storage.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   content/
//!     <sha256(key)>.json    # key, status, headers, body digest, base64 body
//!   shell-staging/
//!   manifest-store/
//! ```
//!
//! Each entry is one file written through a temp file and a rename, so a
//! reader sees either the old or the new entry and same-key writers race
//! to last-writer-wins. Bodies are verified against their digest on read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::digest::{sha256_hex, sha256_prefixed};
use crate::error::{SyncError, SyncResult};
use crate::types::CachedResponse;

use super::{CacheStorage, CacheStore};

/// Temp files older than this belong to a writer that is gone.
const STALE_TEMP_AGE: Duration = Duration::from_secs(600);

/// On-disk form of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    /// Body digest (sha256:...).
    digest: String,
    stored_at: DateTime<Utc>,
    /// Base64 body.
    body: String,
}

/// Stores rooted in a directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> SyncResult<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(SyncError::Config {
                message: format!("invalid store name: {:?}", name),
            });
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStorage for FsStorage {
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn CacheStore>> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::store(format!("failed to create store {}: {}", name, e)))?;
        let store: Arc<dyn CacheStore> = Arc::new(FsStore { dir });
        Ok(store)
    }

    async fn delete(&self, name: &str) -> SyncResult<bool> {
        let dir = self.store_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(store = name, "deleted store");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::store(format!(
                "failed to delete store {}: {}",
                name, e
            ))),
        }
    }

    async fn has(&self, name: &str) -> SyncResult<bool> {
        let dir = self.store_dir(name)?;
        fs::try_exists(&dir)
            .await
            .map_err(|e| SyncError::store(format!("failed to stat store {}: {}", name, e)))
    }
}

/// One store directory.
#[derive(Debug)]
struct FsStore {
    dir: PathBuf,
}

/// Why an entry file could not be turned into a response.
enum EntryFault {
    /// The file could not be read at all.
    Io(SyncError),
    /// The file was read but is not a valid entry.
    Corrupt(String),
}

impl FsStore {
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sha256_hex(key.as_bytes())))
    }

    async fn read_entry(path: &Path) -> Result<Option<StoredEntry>, EntryFault> {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EntryFault::Io(SyncError::store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))))
            }
        };
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|e| EntryFault::Corrupt(format!("unparseable entry: {}", e)))
    }

    /// Drop temp files a crashed writer left behind.
    async fn remove_stale_temp(path: &Path) {
        let age = match fs::metadata(path).await.and_then(|meta| meta.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or_default(),
            Err(_) => return,
        };
        if age < STALE_TEMP_AGE {
            return;
        }
        match fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "removed stale temp file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale temp file"),
        }
    }
}

#[async_trait]
impl CacheStore for FsStore {
    async fn get(&self, key: &str) -> SyncResult<Option<CachedResponse>> {
        // A damaged entry reads as an integrity failure so callers can evict it.
        let corrupt = |actual: String| SyncError::Integrity {
            key: key.to_string(),
            expected: "a well-formed entry".to_string(),
            actual,
        };

        let entry = match Self::read_entry(&self.entry_path(key)).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(None),
            Err(EntryFault::Io(e)) => return Err(e),
            Err(EntryFault::Corrupt(reason)) => {
                warn!(key, reason = %reason, "corrupt store entry");
                return Err(corrupt(reason));
            }
        };

        let body = BASE64
            .decode(&entry.body)
            .map_err(|e| corrupt(format!("invalid body encoding: {}", e)))?;

        let actual = sha256_prefixed(&body);
        if actual != entry.digest {
            warn!(
                key,
                expected = %entry.digest,
                actual = %actual,
                "store integrity check failed"
            );
            return Err(SyncError::Integrity {
                key: key.to_string(),
                expected: entry.digest,
                actual,
            });
        }

        Ok(Some(CachedResponse {
            status: entry.status,
            headers: entry.headers,
            body,
        }))
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> SyncResult<()> {
        let entry = StoredEntry {
            key: key.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            digest: sha256_prefixed(&response.body),
            stored_at: Utc::now(),
            body: BASE64.encode(&response.body),
        };
        let json = serde_json::to_vec(&entry)
            .map_err(|e| SyncError::store(format!("failed to serialize entry: {}", e)))?;

        // The store may have been deleted under an open handle.
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SyncError::store(format!("failed to create store directory: {}", e)))?;
        write_atomic(&self.entry_path(key), &json).await
    }

    async fn delete(&self, key: &str) -> SyncResult<bool> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::store(format!(
                "failed to delete {}: {}",
                key, e
            ))),
        }
    }

    /// Lists readable entries. Corrupt entry files have no recoverable key,
    /// so they are removed here; stale temp files go the same way.
    async fn keys(&self) -> SyncResult<Vec<String>> {
        let mut keys = Vec::new();

        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => {
                return Err(SyncError::store(format!(
                    "failed to read store directory: {}",
                    e
                )))
            }
        };

        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| SyncError::store(format!("failed to read directory entry: {}", e)))?
        {
            let path = item.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => {}
                Some("tmp") => {
                    Self::remove_stale_temp(&path).await;
                    continue;
                }
                _ => continue,
            }
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(EntryFault::Io(e)) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry")
                }
                Err(EntryFault::Corrupt(reason)) => {
                    warn!(path = %path.display(), reason = %reason, "removing corrupt entry");
                    if let Err(e) = fs::remove_file(&path).await {
                        if e.kind() != ErrorKind::NotFound {
                            return Err(SyncError::store(format!(
                                "failed to remove corrupt entry {}: {}",
                                path.display(),
                                e
                            )));
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> SyncResult<()> {
    // Unique temp name: concurrent writers of one key must not share it.
    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));

    fs::write(&temp_path, content)
        .await
        .map_err(|e| SyncError::store(format!("failed to write temp file: {}", e)))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(SyncError::store(format!("failed to rename temp file: {}", e)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FsStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FsStorage::new(temp_dir.path().join("stores"));
        (storage, temp_dir)
    }

    fn response(body: &str) -> CachedResponse {
        CachedResponse::new(200, body).with_header("content-type", "text/javascript")
    }

    #[tokio::test]
    async fn test_store_roundtrip() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();

        store
            .put("https://a.io/main.dart.js", &response("console.log(1)"))
            .await
            .unwrap();

        let entry = store.get("https://a.io/main.dart.js").await.unwrap().unwrap();
        assert_eq!(entry.body, b"console.log(1)");
        assert_eq!(entry.header("Content-Type"), Some("text/javascript"));
        assert_eq!(store.keys().await.unwrap(), vec!["https://a.io/main.dart.js"]);
    }

    #[tokio::test]
    async fn test_binary_body_survives() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        let body = vec![0u8, 159, 146, 150, 255];
        store
            .put("https://a.io/icon.png", &CachedResponse::new(200, body.clone()))
            .await
            .unwrap();
        assert_eq!(store.get("https://a.io/icon.png").await.unwrap().unwrap().body, body);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let (storage, temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("v")).await.unwrap();
        drop(store);

        let reopened = FsStorage::new(temp_dir.path().join("stores"));
        let store = reopened.open("content").await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_integrity_failure() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("original")).await.unwrap();

        // Swap the body without touching the digest.
        let path = storage
            .root()
            .join("content")
            .join(format!("{}.json", sha256_hex(b"k")));
        let raw = fs::read_to_string(&path).await.unwrap();
        let tampered = raw.replace(&BASE64.encode("original"), &BASE64.encode("tampered"));
        fs::write(&path, tampered).await.unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, SyncError::Integrity { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_integrity_and_is_dropped_from_keys() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("good", &response("g")).await.unwrap();
        store.put("bad", &response("b")).await.unwrap();

        let path = storage
            .root()
            .join("content")
            .join(format!("{}.json", sha256_hex(b"bad")));
        let raw = fs::read_to_string(&path).await.unwrap();
        // Truncated mid-write.
        fs::write(&path, &raw[..raw.len() / 2]).await.unwrap();

        let err = store.get("bad").await.unwrap_err();
        assert!(matches!(err, SyncError::Integrity { ref key, .. } if key == "bad"), "{err:?}");

        assert_eq!(store.keys().await.unwrap(), vec!["good"]);
        assert!(!fs::try_exists(&path).await.unwrap(), "corrupt file removed");
        assert!(store.get("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_body_encoding_is_integrity_failure() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("v")).await.unwrap();

        let path = storage
            .root()
            .join("content")
            .join(format!("{}.json", sha256_hex(b"k")));
        let mut entry: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).await.unwrap()).unwrap();
        entry["body"] = serde_json::Value::String("***not base64***".to_string());
        fs::write(&path, entry.to_string()).await.unwrap();

        assert!(matches!(
            store.get("k").await,
            Err(SyncError::Integrity { .. })
        ));
    }

    #[tokio::test]
    async fn test_keys_removes_stale_temp_files_only() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("v")).await.unwrap();

        let dir = storage.root().join("content");
        let stale = dir.join("deadbeef.0000.tmp");
        let fresh = dir.join("deadbeef.1111.tmp");
        std::fs::write(&stale, "partial").unwrap();
        std::fs::write(&fresh, "in flight").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(std::time::SystemTime::now() - STALE_TEMP_AGE * 2)
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["k"]);
        assert!(!stale.exists(), "crashed writer's temp file removed");
        assert!(fresh.exists(), "a live writer's temp file is left alone");
    }

    #[tokio::test]
    async fn test_no_temp_files_remain() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("v")).await.unwrap();
        store.put("k", &response("v2")).await.unwrap();

        let mut entries = fs::read_dir(storage.root().join("content")).await.unwrap();
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "temp file left behind: {}", name);
            count += 1;
        }
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_delete_store_and_entry() {
        let (storage, _temp_dir) = create_test_storage();
        let store = storage.open("content").await.unwrap();
        store.put("k", &response("v")).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());

        assert!(storage.has("content").await.unwrap());
        assert!(storage.delete("content").await.unwrap());
        assert!(!storage.has("content").await.unwrap());
        assert!(!storage.delete("content").await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_like_store_names() {
        let (storage, _temp_dir) = create_test_storage();
        assert!(storage.open("../escape").await.is_err());
        assert!(storage.open("").await.is_err());
        assert!(storage.open("a/b").await.is_err());
    }
}
