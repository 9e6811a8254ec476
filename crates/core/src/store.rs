//! Byte sources backing file snapshots and images.
//!
//! Providers never touch the file system directly; they read through a
//! [`ContentStore`]. Failures come back as [`StoreError`] and are turned
//! into sentinels by the provider layer, never propagated further.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::StoreError;

/// An asynchronous source of file contents.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// A short name for logs (e.g. "local", "memory").
    fn name(&self) -> &str;

    /// Read raw bytes at `path`.
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Read `path` as UTF-8 text. Invalid sequences are replaced.
    async fn read_to_string(&self, path: &str) -> Result<String, StoreError> {
        let bytes = self.read_bytes(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Reads from the local file system via `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    /// Relative paths resolve against this directory. `None` = process cwd.
    root: Option<PathBuf>,
    /// Text reads beyond this many bytes are truncated. `None` = unlimited.
    max_bytes: Option<usize>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Cap text reads at `max_bytes`, followed by a truncation marker.
    /// Raw byte reads (images) are never cut.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        match &self.root {
            Some(root) if candidate.is_relative() => root.join(candidate),
            _ => candidate.to_path_buf(),
        }
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let resolved = self.resolve(path);
        tokio::fs::read(&resolved)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn read_to_string(&self, path: &str) -> Result<String, StoreError> {
        let bytes = self.read_bytes(path).await?;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if let Some(max) = self.max_bytes {
            if text.len() > max {
                debug!(path, size = text.len(), max, "Truncating oversized text read");
                truncate_with_marker(&mut text, max);
            }
        }
        Ok(text)
    }
}

/// Cut `text` to at most `max` bytes on a char boundary and note how much
/// was dropped.
fn truncate_with_marker(text: &mut String, max: usize) {
    let total = text.len();
    let mut cut = max.min(total);
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(&format!("\n[truncated: showing {cut} of {total} bytes]"));
}

/// An in-memory store. Useful for tests and for hosts that stage file
/// contents themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    reads: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the contents at `path`.
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path.into(), contents.into());
    }

    /// Remove `path`; later reads fail with `NotFound`.
    pub fn remove(&self, path: &str) -> bool {
        lock(&self.files).remove(path).is_some()
    }

    /// How many reads (successful or not) have hit `path`.
    pub fn reads(&self, path: &str) -> usize {
        lock(&self.reads).get(path).copied().unwrap_or(0)
    }

    /// Total reads across all paths.
    pub fn total_reads(&self) -> usize {
        lock(&self.reads).values().sum()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        *lock(&self.reads).entry(path.to_string()).or_insert(0) += 1;
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn local_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        let mut f = std::fs::File::create(&file_path).unwrap();
        write!(f, "Hello, world!").unwrap();

        let store = LocalStore::new();
        let text = store
            .read_to_string(file_path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(text, "Hello, world!");
    }

    #[tokio::test]
    async fn local_resolves_against_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "rooted").unwrap();

        let store = LocalStore::new().with_root(dir.path());
        assert_eq!(store.read_to_string("a.txt").await.unwrap(), "rooted");
    }

    #[tokio::test]
    async fn local_missing_file_is_not_found() {
        let store = LocalStore::new();
        let err = store
            .read_bytes("/tmp/promptweave_test_nonexistent_file_12345.txt")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn local_truncates_text_with_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "0123456789").unwrap();

        let store = LocalStore::new().with_root(dir.path()).with_max_bytes(4);
        assert_eq!(
            store.read_to_string("big.txt").await.unwrap(),
            "0123\n[truncated: showing 4 of 10 bytes]"
        );
    }

    #[tokio::test]
    async fn local_text_cut_lands_on_char_boundary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("accent.txt"), "héllo").unwrap();

        let store = LocalStore::new().with_root(dir.path()).with_max_bytes(2);
        let text = store.read_to_string("accent.txt").await.unwrap();
        assert_eq!(text, "h\n[truncated: showing 1 of 6 bytes]");
        assert!(!text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn local_byte_reads_ignore_text_cap() {
        let dir = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = (0..10).collect();
        std::fs::write(dir.path().join("pic.png"), &bytes).unwrap();

        let store = LocalStore::new().with_root(dir.path()).with_max_bytes(4);
        assert_eq!(store.read_bytes("pic.png").await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn local_short_text_has_no_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), "tiny").unwrap();

        let store = LocalStore::new().with_root(dir.path()).with_max_bytes(4);
        assert_eq!(store.read_to_string("small.txt").await.unwrap(), "tiny");
    }

    #[tokio::test]
    async fn memory_store_counts_reads() {
        let store = MemoryStore::new();
        store.insert("a.txt", "alpha");

        assert_eq!(store.read_to_string("a.txt").await.unwrap(), "alpha");
        assert!(store.read_bytes("b.txt").await.unwrap_err().is_not_found());
        assert_eq!(store.reads("a.txt"), 1);
        assert_eq!(store.reads("b.txt"), 1);
        assert_eq!(store.total_reads(), 2);

        assert!(store.remove("a.txt"));
        assert!(store.read_bytes("a.txt").await.is_err());
    }
}
