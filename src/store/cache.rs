//! Time-boxed memo of listing results.
//!
//! Values are stored as JSON so one backend can hold every listing shape. Writes
//! in the store call [`IconSetCache::clear_all`]; entries otherwise expire after
//! their TTL. Expired entries are dropped lazily on read.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::CacheBackendKind;

/// Storage behind [`IconSetCache`]
pub trait CacheBackend: Send + Sync {
    /// Unexpired value for `key`
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value, ttl: Duration);
    /// Drop every entry regardless of TTL
    fn clear(&self);
    fn len(&self) -> usize;
}

#[derive(Debug)]
struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local backend
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCacheBackend {
    fn get(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        // Keys embed directory mtimes, so superseded keys are never read again.
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);

        let entry = MemoryEntry {
            value,
            expires_at: now + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    expires_at_ms: i64,
    value: Value,
}

/// One JSON file per key inside a cache directory, shared across processes
#[derive(Debug)]
pub struct FileCacheBackend {
    dir: PathBuf,
}

impl FileCacheBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{:x}.json", md5::compute(key.as_bytes())))
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect()
    }

    /// Remove entries whose TTL has passed, along with unreadable ones
    fn sweep_expired(&self, now_ms: i64) {
        for path in self.entry_files() {
            let expired = match std::fs::read(&path)
                .ok()
                .and_then(|data| serde_json::from_slice::<FileEntry>(&data).ok())
            {
                Some(entry) => now_ms >= entry.expires_at_ms,
                None => true,
            };
            if expired {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

impl CacheBackend for FileCacheBackend {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let data = std::fs::read(&path).ok()?;
        let entry: FileEntry = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Discarding unreadable cache entry {}: {}", path.display(), e);
                let _ = std::fs::remove_file(&path);
                return None;
            }
        };
        if entry.key != key {
            return None;
        }
        if chrono::Utc::now().timestamp_millis() >= entry.expires_at_ms {
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(entry.value)
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Cannot create cache directory {}: {}", self.dir.display(), e);
            return;
        }
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.sweep_expired(now_ms);

        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = FileEntry {
            key: key.to_string(),
            expires_at_ms: now_ms.saturating_add(ttl_ms),
            value,
        };
        let data = match serde_json::to_vec(&entry) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Cannot serialize cache entry {}: {}", key, e);
                return;
            }
        };

        let path = self.entry_path(key);
        let temp_path = temp_sibling(&path);
        if let Err(e) = std::fs::write(&temp_path, &data) {
            tracing::warn!("Cannot write cache entry {}: {}", temp_path.display(), e);
            return;
        }
        if let Err(e) = std::fs::rename(&temp_path, &path) {
            tracing::warn!("Cannot store cache entry {}: {}", path.display(), e);
            let _ = std::fs::remove_file(&temp_path);
        }
    }

    fn clear(&self) {
        for path in self.entry_files() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Cannot remove cache entry {}: {}", path.display(), e);
            }
        }
    }

    fn len(&self) -> usize {
        self.entry_files().len()
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".tmp-{}", uuid::Uuid::new_v4()));
    path.with_file_name(name)
}

/// Memoizes listings under keys produced by the invalidation deriver
#[derive(Clone)]
pub struct IconSetCache {
    backend: Arc<dyn CacheBackend>,
}

impl IconSetCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn for_kind(kind: CacheBackendKind, cache_dir: &Path) -> Self {
        let backend: Arc<dyn CacheBackend> = match kind {
            CacheBackendKind::Memory => Arc::new(MemoryCacheBackend::new()),
            CacheBackendKind::File => Arc::new(FileCacheBackend::new(cache_dir)),
        };
        Self::new(backend)
    }

    /// Cached value for `key`, or the producer's output (then stored for `ttl`)
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.backend.get(key) {
            match serde_json::from_value(cached) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    return value;
                }
                Err(e) => tracing::warn!("Ignoring cached value for {}: {}", key, e),
            }
        }

        tracing::debug!("Cache miss: {}", key);
        let value = producer().await;
        match serde_json::to_value(&value) {
            Ok(json) => self.backend.put(key, json, ttl),
            Err(e) => tracing::warn!("Not caching {}: {}", key, e),
        }
        value
    }

    pub fn clear_all(&self) {
        self.backend.clear();
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    async fn count_calls(
        cache: &IconSetCache,
        key: &str,
        ttl: Duration,
        calls: &AtomicUsize,
    ) -> Vec<String> {
        cache
            .get_or_compute(key, ttl, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                vec!["star".to_string()]
            })
            .await
    }

    #[tokio::test]
    async fn memory_backend_memoizes_until_cleared() {
        let cache = IconSetCache::new(Arc::new(MemoryCacheBackend::new()));
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);

        assert_eq!(count_calls(&cache, "icon_sets_1", ttl, &calls).await, vec!["star"]);
        count_calls(&cache, "icon_sets_1", ttl, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.clear_all();
        assert!(cache.is_empty());
        count_calls(&cache, "icon_sets_1", ttl, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() {
        let cache = IconSetCache::new(Arc::new(MemoryCacheBackend::new()));
        let calls = AtomicUsize::new(0);

        count_calls(&cache, "k", Duration::from_millis(10), &calls).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        count_calls(&cache, "k", Duration::from_millis(10), &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn storing_a_key_evicts_expired_entries() {
        let cache = IconSetCache::new(Arc::new(MemoryCacheBackend::new()));
        let calls = AtomicUsize::new(0);

        for key in ["icon_sets_1", "icon_sets_2", "icon_sets_3"] {
            count_calls(&cache, key, Duration::from_millis(10), &calls).await;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        count_calls(&cache, "icon_sets_4", Duration::from_secs(300), &calls).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn file_backend_evicts_expired_entries() {
        let temp = TempDir::new().unwrap();
        let cache = IconSetCache::for_kind(CacheBackendKind::File, temp.path());
        let calls = AtomicUsize::new(0);

        for key in ["all_icons_1", "all_icons_2"] {
            count_calls(&cache, key, Duration::from_millis(10), &calls).await;
        }
        std::fs::write(temp.path().join("garbage.json"), "not json").unwrap();
        assert_eq!(cache.len(), 3);

        tokio::time::sleep(Duration::from_millis(30)).await;
        count_calls(&cache, "all_icons_3", Duration::from_secs(300), &calls).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn file_backend_is_shared_between_instances() {
        let temp = TempDir::new().unwrap();
        let first = IconSetCache::for_kind(CacheBackendKind::File, temp.path());
        let second = IconSetCache::for_kind(CacheBackendKind::File, temp.path());
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);

        count_calls(&first, "all_icons_42", ttl, &calls).await;
        count_calls(&second, "all_icons_42", ttl, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.len(), 1);

        second.clear_all();
        assert!(first.is_empty());
    }
}
