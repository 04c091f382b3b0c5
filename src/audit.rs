//! The audit pipeline: inventories, walkers, sweep, optional removal.
//!
//! Everything runs as one synchronous pass over explicit local state:
//! build both inventories, walk images, walk containers, then sweep. Any
//! fatal error propagates immediately and no partial mark state is trusted.
//! The optional removal pass is the only part that mutates disk, and it is
//! best-effort per entity: one failed deletion never stops the rest.

use log::{debug, warn};

use crate::container::walk_containers;
use crate::driver::DriverFamily;
use crate::error::Result;
use crate::image::walk_images;
use crate::layerdb::LayerDbIndex;
use crate::raw::RawLayerInventory;
use crate::store::Store;

/// Outcome of the mark phase: the entities nothing references.
///
/// Both lists are in discovery order. An empty report is a clean pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Ids of layer metadata records no image reaches.
    pub leaked_records: Vec<String>,

    /// Ids of raw layers no record and no container reaches, the driver
    /// sentinel excluded.
    pub leaked_layers: Vec<String>,
}

impl AuditReport {
    /// Whether the store had no unreferenced entities at all.
    pub fn is_clean(&self) -> bool {
        self.leaked_records.is_empty() && self.leaked_layers.is_empty()
    }
}

/// Counters for the removal pass, reported even when incomplete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemovalSummary {
    /// Entities physically removed.
    pub removed: u64,

    /// Entities whose removal failed; each failure is logged as it happens.
    pub failed: u64,
}

impl RemovalSummary {
    /// Whether every condemned entity was actually removed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Run the full mark phase against an opened store.
///
/// # Errors
///
/// Propagates the first structural, I/O, parse, or consistency error.
/// Leak findings are not errors and land in the returned report.
pub fn audit(store: &Store) -> Result<AuditReport> {
    let mut inventory = RawLayerInventory::scan(store)?;
    let mut index = LayerDbIndex::load(store)?;
    debug!(
        "scanned {} raw layers and {} layer records under {}",
        inventory.len(),
        index.len(),
        store.root().display()
    );

    walk_images(store, &mut index, &mut inventory)?;
    walk_containers(store, &mut inventory)?;

    Ok(sweep(&index, &inventory, store.driver()))
}

/// Collect everything left unmarked, in discovery order.
fn sweep(index: &LayerDbIndex, inventory: &RawLayerInventory, driver: DriverFamily) -> AuditReport {
    let leaked_records = index
        .unreferenced()
        .map(|record| record.id().to_string())
        .collect();

    let sentinel = driver.sentinel();
    let leaked_layers = inventory
        .unreferenced()
        .filter(|layer| Some(layer.id()) != sentinel)
        .map(|layer| layer.id().to_string())
        .collect();

    AuditReport {
        leaked_records,
        leaked_layers,
    }
}

/// Physically remove every entity in the report.
///
/// Metadata records are plain directories on every platform and are removed
/// recursively; raw layers go through the driver family's
/// [`LayerRemover`](crate::remove::LayerRemover). Each removal is
/// independent: failures are logged, counted, and skipped past.
pub fn remove_leaked(store: &Store, report: &AuditReport) -> RemovalSummary {
    let mut summary = RemovalSummary::default();

    for id in &report.leaked_records {
        match store.layerdb_dir().remove_dir_all(id) {
            Ok(()) => {
                debug!("removed layer record {id}");
                summary.removed += 1;
            }
            Err(err) => {
                warn!("failed to remove layer record {id}: {err}");
                summary.failed += 1;
            }
        }
    }

    let remover = store.driver().remover();
    for id in &report.leaked_layers {
        match remover.remove_layer(store.layer_dir(), id) {
            Ok(()) => {
                debug!("removed raw layer {id}");
                summary.removed += 1;
            }
            Err(err) => {
                warn!("failed to remove raw layer {id}: {err}");
                summary.failed += 1;
            }
        }
    }

    summary
}
