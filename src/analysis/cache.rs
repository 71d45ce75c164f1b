//! Analysis result cache keyed by file identity
//!
//! A key is the file path, its modification time and the analyzer
//! fingerprint. Entries are written once per key; a second `put` for the
//! same key is ignored.

use crate::model::TrackAnalysis;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    /// Modification time in milliseconds since the epoch
    pub mtime: u64,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(path: &Path, mtime: u64, fingerprint: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            mtime,
            fingerprint: fingerprint.to_string(),
        }
    }

    /// Key for a file on disk, `None` if it cannot be stat'ed
    pub fn for_file(path: &Path, fingerprint: &str) -> Option<Self> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        let mtime = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Some(Self::new(path, mtime, fingerprint))
    }

    /// Stable hex digest, used as a file name
    pub fn digest(&self) -> String {
        let raw = format!(
            "{}|{}|{}",
            self.path.to_string_lossy(),
            self.mtime,
            self.fingerprint
        );
        format!("{:x}", md5::compute(raw.as_bytes()))
    }
}

/// Injectable key-value store for analysis results
pub trait AnalysisCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<TrackAnalysis>;

    /// Store a result; ignored when the key is already present
    fn put(&self, key: &CacheKey, analysis: &TrackAnalysis);
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, TrackAnalysis>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<TrackAnalysis> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &CacheKey, analysis: &TrackAnalysis) {
        if let Ok(mut entries) = self.entries.write() {
            entries
                .entry(key.clone())
                .or_insert_with(|| analysis.clone());
        }
    }
}

/// One JSON file per key under a cache directory
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }
}

impl AnalysisCache for JsonFileCache {
    fn get(&self, key: &CacheKey) -> Option<TrackAnalysis> {
        let path = self.entry_path(key);
        let data = std::fs::read(&path).ok()?;
        match serde_json::from_slice(&data) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                log::warn!("Ignoring corrupt cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, analysis: &TrackAnalysis) {
        let path = self.entry_path(key);
        if path.exists() {
            return;
        }
        let json = match serde_json::to_vec(analysis) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize analysis for {:?}: {}", key.path, e);
                return;
            }
        };
        // write to a sibling then rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        let result = std::fs::write(&tmp, json).and_then(|_| std::fs::rename(&tmp, &path));
        if let Err(e) = result {
            log::warn!("Failed to write cache entry {:?}: {}", path, e);
            let _ = std::fs::remove_file(&tmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TrackAnalysis {
        TrackAnalysis::from_metadata(120.0, 124.0, None, 5)
    }

    #[test]
    fn test_memory_cache_write_once() {
        let cache = MemoryCache::new();
        let key = CacheKey::new(Path::new("/music/a.mp3"), 10, "fp");
        assert!(cache.get(&key).is_none());

        cache.put(&key, &sample());
        let mut other = sample();
        other.bpm = 90.0;
        cache.put(&key, &other);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().bpm, 124.0);
    }

    #[test]
    fn test_key_changes_with_mtime_and_fingerprint() {
        let a = CacheKey::new(Path::new("/a.mp3"), 1, "x");
        let b = CacheKey::new(Path::new("/a.mp3"), 2, "x");
        let c = CacheKey::new(Path::new("/a.mp3"), 1, "y");
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest(), a.clone().digest());
    }

    #[test]
    fn test_json_cache_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = JsonFileCache::new(dir.path().join("cache")).unwrap();
        let key = CacheKey::new(Path::new("/music/b.flac"), 42, "fp");

        // 0.97 * 120 is not a short decimal
        let analysis = sample();
        cache.put(&key, &analysis);
        let cached = cache.get(&key).unwrap();
        assert_eq!(cached.mix_out_point.to_bits(), analysis.mix_out_point.to_bits());
        assert_eq!(cached, analysis);

        let missing = CacheKey::new(Path::new("/music/b.flac"), 43, "fp");
        assert!(cache.get(&missing).is_none());
    }

    #[test]
    fn test_json_cache_ignores_corrupt_entry() {
        let dir = TempDir::new().unwrap();
        let cache = JsonFileCache::new(dir.path()).unwrap();
        let key = CacheKey::new(Path::new("/x.wav"), 1, "fp");
        std::fs::write(cache.entry_path(&key), b"{not json").unwrap();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_for_file_reads_mtime() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("t.wav");
        std::fs::write(&file, b"data").unwrap();
        let key = CacheKey::for_file(&file, "fp").unwrap();
        assert!(key.mtime > 0);
        assert!(CacheKey::for_file(&dir.path().join("none.wav"), "fp").is_none());
    }
}
