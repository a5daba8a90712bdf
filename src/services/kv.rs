//! String-keyed record store: get/set plus wildcard prefix listing.
//!
//! The store carries no schema and no transactions. Listing takes a
//! `prefix*` pattern and returns entries in the store's own order — the
//! pipeline never re-sorts, so two listings with no intervening writes
//! return the same sequence.

use crate::error::AnalyzeError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// One listed entry: the key it was stored under and its raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// String-keyed get/set/list.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AnalyzeError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AnalyzeError>;

    /// List every entry whose key matches `pattern` (`prefix*` form).
    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, AnalyzeError>;
}

/// Match a key against a `prefix*` wildcard pattern.
///
/// Only the trailing-star form is supported; a pattern without `*` matches
/// exactly.
pub(crate) fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

/// In-memory store used by tests and single-process callers.
///
/// A `BTreeMap` keeps listing order deterministic (lexicographic by key).
#[derive(Default)]
pub struct MemoryRecordStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Test-support helper.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AnalyzeError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AnalyzeError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, AnalyzeError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| key_matches(pattern, k))
            .map(|(k, v)| KvEntry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }
}

/// Directory-backed store: one file per key under the root.
///
/// Keys contain `:` which is awkward on some filesystems, so the on-disk
/// name replaces it with `__`. Writes are atomic (temp + rename) like every
/// other persistence point in this crate.
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_name(key: &str) -> String {
        format!("{}.json", key.replace(':', "__"))
    }

    fn key_of(file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(".json")
            .map(|stem| stem.replace("__", ":"))
    }

    fn io_err(op: &str, e: std::io::Error) -> AnalyzeError {
        AnalyzeError::Store {
            detail: format!("{op}: {e}"),
        }
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AnalyzeError> {
        match tokio::fs::read_to_string(self.root.join(Self::file_name(key))).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err("read record", e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AnalyzeError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Self::io_err("create store root", e))?;

        let dest = self.root.join(Self::file_name(key));
        let tmp = dest.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| Self::io_err("write record", e))?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| Self::io_err("finalize record", e))
    }

    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, AnalyzeError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_err("list records", e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Self::io_err("list records", e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = Self::key_of(&name) else {
                continue;
            };
            if !key_matches(pattern, &key) {
                continue;
            }
            let value = tokio::fs::read_to_string(entry.path())
                .await
                .map_err(|e| Self::io_err("read record", e))?;
            entries.push(KvEntry { key, value });
        }

        // read_dir order is platform-dependent; sort so repeated listings
        // with no intervening writes return the same sequence.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matching_is_prefix_star_only() {
        assert!(key_matches("resume:*", "resume:abc"));
        assert!(!key_matches("resume:*", "resumes:abc"));
        assert!(key_matches("resume:abc", "resume:abc"));
        assert!(!key_matches("resume:abc", "resume:abcd"));
    }

    #[tokio::test]
    async fn memory_store_set_get_list() {
        let store = MemoryRecordStore::new();
        store.set("resume:1", "{\"a\":1}").await.unwrap();
        store.set("resume:2", "{\"a\":2}").await.unwrap();
        store.set("other:3", "{}").await.unwrap();

        assert_eq!(store.get("resume:1").await.unwrap().unwrap(), "{\"a\":1}");
        assert!(store.get("resume:missing").await.unwrap().is_none());

        let listed = store.list("resume:*").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "resume:1");
    }

    #[tokio::test]
    async fn memory_store_overwrites_in_place() {
        let store = MemoryRecordStore::new();
        store.set("resume:1", "draft").await.unwrap();
        store.set("resume:1", "final").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("resume:1").await.unwrap().unwrap(), "final");
    }

    #[tokio::test]
    async fn fs_store_round_trips_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());

        store.set("resume:a", "one").await.unwrap();
        store.set("resume:b", "two").await.unwrap();

        assert_eq!(store.get("resume:a").await.unwrap().unwrap(), "one");
        assert!(store.get("resume:c").await.unwrap().is_none());

        let listed = store.list("resume:*").await.unwrap();
        assert_eq!(
            listed.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(),
            vec!["resume:a", "resume:b"]
        );
    }

    #[tokio::test]
    async fn fs_store_listing_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path().join("never-created"));
        assert!(store.list("resume:*").await.unwrap().is_empty());
    }
}
