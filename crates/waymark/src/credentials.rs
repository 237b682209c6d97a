//! Read-through cache for file-backed credential material.
//!
//! Certificate, key, CA, and PFX paths named by rules are read once per
//! engine lifetime: the first read is memoized and every later build reuses
//! the cached content. Entries are immutable once stored, so equivalent reads
//! of one path always converge on a single value even if concurrent first
//! reads each touch the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Memoizing file reader owned by the engine facade.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: Mutex<HashMap<PathBuf, Arc<String>>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a file through the cache.
    ///
    /// The read happens outside the lock, so two racing first reads may both
    /// hit the disk; the first insert wins and both callers see its value.
    pub fn read(&self, path: &Path) -> Result<Arc<String>> {
        if let Some(content) = self.entries.lock().get(path) {
            return Ok(Arc::clone(content));
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::CredentialFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "cached credential file");

        let mut entries = self.entries.lock();
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(content));
        Ok(Arc::clone(entry))
    }

    /// Number of distinct paths cached so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_through() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cert.pem");
        std::fs::write(&path, "certificate material").unwrap();

        let cache = FileCache::new();
        let content = cache.read(&path).unwrap();
        assert_eq!(content.as_str(), "certificate material");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_read_is_memoized() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("key.pem");
        std::fs::write(&path, "original").unwrap();

        let cache = FileCache::new();
        let first = cache.read(&path).unwrap();

        // Mutating the file on disk must not leak into later reads.
        std::fs::write(&path, "replaced").unwrap();
        let second = cache.read(&path).unwrap();

        assert_eq!(first.as_str(), "original");
        assert_eq!(second.as_str(), "original");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_a_resource_error() {
        let cache = FileCache::new();
        let err = cache.read(Path::new("/no/such/file.pem")).unwrap_err();
        assert!(matches!(err, Error::CredentialFile { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_racing_first_reads_converge_on_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shared.pem");
        std::fs::write(&path, "shared material").unwrap();

        let cache = Arc::new(FileCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                std::thread::spawn(move || cache.read(&path).unwrap())
            })
            .collect();
        let contents: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 1);
        for content in &contents {
            assert!(Arc::ptr_eq(content, &contents[0]));
            assert_eq!(content.as_str(), "shared material");
        }
    }

    #[test]
    fn test_distinct_paths_cache_separately() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.pem");
        let b = tmp.path().join("b.pem");
        std::fs::write(&a, "aaa").unwrap();
        std::fs::write(&b, "bbb").unwrap();

        let cache = FileCache::new();
        assert_eq!(cache.read(&a).unwrap().as_str(), "aaa");
        assert_eq!(cache.read(&b).unwrap().as_str(), "bbb");
        assert_eq!(cache.len(), 2);
    }
}
