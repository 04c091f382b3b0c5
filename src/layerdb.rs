//! Index of layer metadata records, keyed by content hash.
//!
//! Each immediate subdirectory of `image/<driver>/layerdb/sha256/` is one
//! record, holding exactly two small files the audit consumes: `diff` (the
//! content hash the record is keyed by) and `cache-id` (the raw layer it
//! maps to). Both are opaque trimmed strings. A record missing either file
//! indicates runtime-level corruption and aborts the whole audit; skipping
//! it would silently hide a real inconsistency.

use std::collections::HashMap;

use cap_std::fs::Dir;
use log::warn;

use crate::error::{AuditError, Result};
use crate::store::Store;

/// One entry in the layer metadata store.
#[derive(Debug)]
pub struct LayerRecord {
    id: String,
    diff_id: String,
    cache_id: String,
    reachable: bool,
}

impl LayerRecord {
    /// The metadata-store directory name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The content hash this record is keyed by.
    pub fn diff_id(&self) -> &str {
        &self.diff_id
    }

    /// The raw layer id this record maps to.
    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    /// Whether the image walk marked this record reachable.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }
}

/// All layer metadata records of a store, indexed by content hash and kept
/// in discovery order.
#[derive(Debug, Default)]
pub struct LayerDbIndex {
    records: Vec<LayerRecord>,
    by_diff: HashMap<String, usize>,
}

impl LayerDbIndex {
    /// Read every metadata record under the layerdb store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or if any record's
    /// `diff` or `cache-id` file cannot be read.
    pub fn load(store: &Store) -> Result<Self> {
        let mut index = Self::default();
        let read_err = |e| AuditError::Read {
            path: store.layerdb_path(),
            source: e,
        };

        for entry in store.layerdb_dir().entries().map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_dir() {
                continue;
            }
            let Ok(id) = entry.file_name().into_string() else {
                continue;
            };

            let record_dir = store
                .layerdb_dir()
                .open_dir(&id)
                .map_err(|e| AuditError::Read {
                    path: store.layerdb_path().join(&id),
                    source: e,
                })?;
            let diff_id = Self::read_field(store, &record_dir, &id, "diff")?;
            let cache_id = Self::read_field(store, &record_dir, &id, "cache-id")?;
            index.insert(id, diff_id, cache_id);
        }

        Ok(index)
    }

    /// Read one per-record file as an opaque trimmed string.
    fn read_field(store: &Store, record_dir: &Dir, id: &str, name: &str) -> Result<String> {
        record_dir
            .read_to_string(name)
            .map(|content| content.trim().to_string())
            .map_err(|e| AuditError::Read {
                path: store.layerdb_path().join(id).join(name),
                source: e,
            })
    }

    fn insert(&mut self, id: String, diff_id: String, cache_id: String) {
        let idx = self.records.len();
        if let Some(prev) = self.by_diff.insert(diff_id.clone(), idx) {
            // Preserved engine behavior: the lookup table keeps the later
            // record and the earlier one drops out of the audit entirely.
            warn!(
                "layer records {} and {} share diff id {}; keeping the latter",
                self.records[prev].id, id, diff_id
            );
        }
        self.records.push(LayerRecord {
            id,
            diff_id,
            cache_id,
            reachable: false,
        });
    }

    /// Look up a record by content hash without marking it.
    pub fn get(&self, diff_id: &str) -> Option<&LayerRecord> {
        self.by_diff.get(diff_id).map(|&idx| &self.records[idx])
    }

    /// Mark the record keyed by `diff_id` reachable and return it, or `None`
    /// if no record carries that content hash.
    pub fn mark_reachable(&mut self, diff_id: &str) -> Option<&LayerRecord> {
        match self.by_diff.get(diff_id) {
            Some(&idx) => {
                self.records[idx].reachable = true;
                Some(&self.records[idx])
            }
            None => None,
        }
    }

    /// Number of records read, shadowed ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the metadata store held no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerRecord> {
        self.records.iter()
    }

    /// Records without a reachability mark, in discovery order.
    ///
    /// A record shadowed by a later one with the same diff id no longer owns
    /// its index entry and is not swept, matching the lookup-table semantics
    /// the engine itself uses.
    pub fn unreferenced(&self) -> impl Iterator<Item = &LayerRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|&(idx, record)| {
                !record.reachable && self.by_diff.get(record.diff_id.as_str()).copied() == Some(idx)
            })
            .map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(records: &[(&str, &str, &str)]) -> LayerDbIndex {
        let mut index = LayerDbIndex::default();
        for (id, diff_id, cache_id) in records {
            index.insert(id.to_string(), diff_id.to_string(), cache_id.to_string());
        }
        index
    }

    #[test]
    fn test_mark_returns_the_record() {
        let mut index = index_of(&[("a", "h1", "p1")]);
        assert!(!index.get("h1").unwrap().is_reachable());
        let record = index.mark_reachable("h1").unwrap();
        assert_eq!(record.id(), "a");
        assert_eq!(record.cache_id(), "p1");
        assert!(index.unreferenced().next().is_none());
    }

    #[test]
    fn test_unknown_diff_id_is_none() {
        let mut index = index_of(&[("a", "h1", "p1")]);
        assert!(index.mark_reachable("h9").is_none());
    }

    #[test]
    fn test_duplicate_diff_id_keeps_the_later_record() {
        let mut index = index_of(&[("a", "h1", "p1"), ("b", "h1", "p2")]);
        let record = index.mark_reachable("h1").unwrap();
        assert_eq!(record.id(), "b");
        // The shadowed record is neither marked nor swept.
        assert!(index.unreferenced().next().is_none());
    }

    #[test]
    fn test_unreferenced_keeps_discovery_order() {
        let index = index_of(&[("b", "h2", "p2"), ("a", "h1", "p1")]);
        let ids: Vec<_> = index.unreferenced().map(LayerRecord::id).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
