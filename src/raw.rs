//! Inventory of raw on-disk layer directories.
//!
//! A raw layer is one immediate subdirectory of the driver's layer store
//! (`<driver>/*`), holding one filesystem layer's data under an opaque
//! runtime-assigned id. The inventory is the leaf of the reference graph:
//! both walkers resolve down to marks on these entries.

use std::collections::HashMap;

use crate::error::{AuditError, Result};
use crate::store::Store;

/// One physical layer directory in the driver's layer store.
#[derive(Debug)]
pub struct RawLayer {
    id: String,
    reachable: bool,
}

impl RawLayer {
    /// The layer directory name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether any walker marked this layer reachable.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }
}

/// All raw layers of a store, in discovery order.
///
/// Marks are monotonic: a walker can only flip an entry from unreachable to
/// reachable, never back.
#[derive(Debug, Default)]
pub struct RawLayerInventory {
    layers: Vec<RawLayer>,
    by_id: HashMap<String, usize>,
}

impl RawLayerInventory {
    /// Enumerate every immediate subdirectory of the raw layer store.
    ///
    /// Non-directory entries are ignored. Nothing on disk is touched beyond
    /// the listing itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer store cannot be listed. An unreadable
    /// store makes the rest of the audit meaningless, so this is fatal.
    pub fn scan(store: &Store) -> Result<Self> {
        let mut inventory = Self::default();
        let read_err = |e| AuditError::Read {
            path: store.layer_path(),
            source: e,
        };

        for entry in store.layer_dir().entries().map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_dir() {
                continue;
            }
            let Ok(id) = entry.file_name().into_string() else {
                continue;
            };
            inventory.insert(id);
        }

        Ok(inventory)
    }

    fn insert(&mut self, id: String) {
        let idx = self.layers.len();
        self.layers.push(RawLayer {
            id: id.clone(),
            reachable: false,
        });
        self.by_id.insert(id, idx);
    }

    /// Mark the named layer reachable. Returns whether such a layer exists.
    pub fn mark_reachable(&mut self, id: &str) -> bool {
        match self.by_id.get(id) {
            Some(&idx) => {
                self.layers[idx].reachable = true;
                true
            }
            None => false,
        }
    }

    /// Whether the inventory holds a layer with this id.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of inventoried layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the layer store held no layers at all.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &RawLayer> {
        self.layers.iter()
    }

    /// Layers without a reachability mark, in discovery order.
    pub fn unreferenced(&self) -> impl Iterator<Item = &RawLayer> {
        self.layers.iter().filter(|layer| !layer.reachable)
    }
}
