//! Presence-only payload cache.
//!
//! An entry is a raw payload stored under a key. There is no expiry and no
//! validation: a missing or zero-length entry is a miss, anything else is a
//! hit (even text that is not valid JSON). A file entry that is not UTF-8
//! is a read error rather than a hit.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Suffix appended to the key to form the cache file name.
pub const CACHE_FILE_SUFFIX: &str = "_cache.json";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read cache entry {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write cache entry {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Key/payload persistence consulted before any collector runs.
pub trait PayloadCache: Send + Sync {
    /// The cached payload, or `None` when absent or empty.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>>;

    /// Store `payload` under `key`, replacing any previous entry.
    fn put<'a>(&'a self, key: &'a str, payload: &'a str) -> BoxFuture<'a, Result<(), CacheError>>;
}

// ── FileCache ──────────────────────────────────────────────────────

/// One raw file per key at `<dir>/<key>_cache.json`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers never observe a partially written entry.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache in the system temporary directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}{CACHE_FILE_SUFFIX}"))
    }

    async fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss for {key}: {} not found", path.display());
                return Ok(None);
            }
            Err(source) => return Err(CacheError::Read { path, source }),
        };
        if bytes.is_empty() {
            debug!("Cache miss for {key}: {} is empty", path.display());
            return Ok(None);
        }
        debug!("Cache hit for {key} ({} bytes)", bytes.len());
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| CacheError::Read {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })
    }

    async fn write(&self, key: &str, payload: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        let tmp = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            path.file_name().map_or_else(|| key.into(), |n| n.to_string_lossy()),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        ));
        trace!("Writing {} bytes to {}", payload.len(), tmp.display());

        if let Err(e) = tokio::fs::write(&tmp, payload).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        debug!("Cached {key} at {} ({} bytes)", path.display(), payload.len());
        Ok(())
    }
}

impl PayloadCache for FileCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        Box::pin(self.read(key))
    }

    fn put<'a>(&'a self, key: &'a str, payload: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(self.write(key, payload))
    }
}

// ── MemoryCache ────────────────────────────────────────────────────

/// In-process cache with the same miss rules as [`FileCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PayloadCache for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        let hit = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .filter(|p| !p.is_empty())
            .cloned();
        Box::pin(async move { Ok(hit) })
    }

    fn put<'a>(&'a self, key: &'a str, payload: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), payload.to_string());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        assert_eq!(cache.get("kusto_logs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_length_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        std::fs::write(cache.path_for("kusto_logs"), "").unwrap();
        assert_eq!(cache.get("kusto_logs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_utf8_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        std::fs::write(cache.path_for("kusto_logs"), [b'[', 0xff, 0xfe, b']']).unwrap();

        let err = cache.get("kusto_logs").await.unwrap_err();
        match err {
            CacheError::Read { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_payload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.put("kusto_logs", r#"[{"id":1}]"#).await.unwrap();

        assert_eq!(
            cache.get("kusto_logs").await.unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        let on_disk = std::fs::read_to_string(dir.path().join("kusto_logs_cache.json")).unwrap();
        assert_eq!(on_disk, r#"[{"id":1}]"#);
    }

    #[tokio::test]
    async fn malformed_payload_is_still_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        std::fs::write(cache.path_for("kusto_logs"), "{not json").unwrap();
        assert_eq!(
            cache.get("kusto_logs").await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn put_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));
        cache.put("k", "first").await.unwrap();
        cache.put("k", "second").await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));
        let files: Vec<_> = std::fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["k_cache.json".to_string()]);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let cache = FileCache::new("/tmp/x");
        assert_eq!(
            cache.path_for("../etc/passwd"),
            PathBuf::from("/tmp/x/___etc_passwd_cache.json")
        );
    }

    #[tokio::test]
    async fn memory_cache_treats_empty_as_miss() {
        let cache = MemoryCache::new();
        cache.put("k", "").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.put("k", "data").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("data"));
        assert_eq!(cache.len(), 1);
    }
}
