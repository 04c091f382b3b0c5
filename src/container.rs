//! Container reference walk.
//!
//! Containers reference raw layers through a side channel that bypasses the
//! metadata index: the container's directory name under `containers/` equals
//! the id of its writable layer. This walk only adds marks. A container name
//! with no matching raw layer is not an error, because a container can
//! reference layers through paths this scan does not model (init and diff
//! layers among them).

use log::debug;

use crate::error::{AuditError, Result};
use crate::raw::RawLayerInventory;
use crate::store::Store;

/// Mark the writable layer of every container in the store.
///
/// # Errors
///
/// Returns an error only if the container store itself cannot be listed.
pub fn walk_containers(store: &Store, inventory: &mut RawLayerInventory) -> Result<()> {
    let read_err = |e| AuditError::Read {
        path: store.container_path(),
        source: e,
    };

    for entry in store.container_dir().entries().map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.file_type().map_err(read_err)?.is_dir() {
            continue;
        }
        let Ok(id) = entry.file_name().into_string() else {
            continue;
        };

        if inventory.mark_reachable(&id) {
            debug!("container {id} pins its writable layer");
        } else {
            debug!("container {id} matches no raw layer");
        }
    }

    Ok(())
}
