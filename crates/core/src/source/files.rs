//! Snapshots of tracked files.
//!
//! Each entry remembers whether its content came from the store (`Disk`) or
//! was supplied by the caller (`Manual`). On refresh every path is re-read:
//! a successful read always wins and flips the entry to `Disk`. A failed
//! read turns a `Disk` entry into an inline error string and leaves a
//! `Manual` entry untouched.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    Disk,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    /// `None` until a disk entry has been read for the first time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub origin: FileOrigin,
    /// Only the first `head` lines are rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<usize>,
}

impl FileEntry {
    fn rendered_content(&self) -> Option<String> {
        let content = self.content.as_deref()?;
        Some(match self.head {
            Some(n) => content.lines().take(n).collect::<Vec<_>>().join("\n"),
            None => content.to_string(),
        })
    }
}

/// Ordered set of tracked paths.
#[derive(Debug, Clone, Default)]
pub struct FileSnapshot {
    entries: Vec<FileEntry>,
}

impl FileSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track `path`. With `content`, the entry is provisionally manual and
    /// is superseded as soon as the path becomes readable. Without it, the
    /// path is read on the next refresh.
    pub fn update(&mut self, path: &str, content: Option<String>, head: Option<usize>) {
        let (content, origin) = match content {
            Some(c) => (Some(c), FileOrigin::Manual),
            None => (None, FileOrigin::Disk),
        };
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                if content.is_some() {
                    entry.content = content;
                }
                entry.origin = origin;
                entry.head = head;
            }
            None => self.entries.push(FileEntry {
                path: path.to_string(),
                content,
                origin,
                head,
            }),
        }
    }

    /// Stop tracking `path`.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        self.entries.len() < before
    }

    pub(crate) fn replace_entries(&mut self, entries: Vec<FileEntry>) {
        self.entries = entries;
    }
}

/// Re-read every entry from `store`, concurrently.
pub(crate) async fn reload(entries: Vec<FileEntry>, store: &dyn ContentStore) -> Vec<FileEntry> {
    join_all(entries.into_iter().map(|entry| reload_one(entry, store))).await
}

async fn reload_one(mut entry: FileEntry, store: &dyn ContentStore) -> FileEntry {
    match store.read_to_string(&entry.path).await {
        Ok(text) => {
            entry.content = Some(text);
            entry.origin = FileOrigin::Disk;
        }
        Err(e) => match entry.origin {
            FileOrigin::Disk => {
                warn!(path = %entry.path, error = %e, "Tracked file could not be read");
                entry.content = Some(error_sentinel(&e));
            }
            FileOrigin::Manual => {
                debug!(path = %entry.path, "Keeping manual content, file not readable");
            }
        },
    }
    entry
}

fn error_sentinel(err: &StoreError) -> String {
    match err {
        StoreError::NotFound(path) => format!("[error] file not found: {path}"),
        StoreError::Io { path, reason } => format!("[error] could not read {path}: {reason}"),
    }
}

/// `None` when nothing is tracked.
pub(crate) fn render(entries: &[FileEntry]) -> Option<String> {
    let blocks: Vec<String> = entries
        .iter()
        .filter_map(|e| {
            e.rendered_content()
                .map(|c| format!("<file path=\"{}\">\n{}\n</file>", e.path, c))
        })
        .collect();
    if blocks.is_empty() {
        return None;
    }
    Some(format!("<files>\n{}\n</files>", blocks.join("\n")))
}
