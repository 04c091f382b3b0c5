//! Physical deletion of leaked layers.
//!
//! Deletion is a capability selected from the driver family at startup, so
//! the audit core never branches on platform. The overlay family's layers
//! are ordinary directory trees; the windowsfilter family keeps auxiliary
//! driver state keyed by the layer directory name and requires a two-step
//! teardown.

use std::io;

use cap_std::fs::Dir;

/// Capability interface for destroying one on-disk layer.
pub trait LayerRemover {
    /// Remove the layer directory named `id` from the layer store.
    fn remove_layer(&self, layer_store: &Dir, id: &str) -> io::Result<()>;
}

/// Plain recursive removal, used by the overlay driver family.
#[derive(Debug)]
pub struct RecursiveRemover;

impl LayerRemover for RecursiveRemover {
    fn remove_layer(&self, layer_store: &Dir, id: &str) -> io::Result<()> {
        layer_store.remove_dir_all(id)
    }
}

/// Two-step teardown for the windowsfilter driver family.
///
/// The directory is first renamed aside under the driver's own removal
/// protocol (`<id>-removing`), which detaches the auxiliary state keyed by
/// the original name, and only then destroyed. An interrupted teardown
/// leaves the renamed directory behind, which the driver already treats as
/// dead.
#[derive(Debug)]
pub struct WindowsFilterRemover;

impl LayerRemover for WindowsFilterRemover {
    fn remove_layer(&self, layer_store: &Dir, id: &str) -> io::Result<()> {
        let staging = format!("{id}-removing");
        layer_store.rename(id, layer_store, &staging)?;
        layer_store.remove_dir_all(staging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_std::ambient_authority;

    fn layer_store_with(id: &str) -> (tempfile::TempDir, Dir) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(id)).unwrap();
        std::fs::write(tmp.path().join(id).join("data"), b"layer contents").unwrap();
        let dir = Dir::open_ambient_dir(tmp.path(), ambient_authority()).unwrap();
        (tmp, dir)
    }

    #[test]
    fn test_recursive_remover_deletes_the_tree() {
        let (tmp, store) = layer_store_with("p1");
        RecursiveRemover.remove_layer(&store, "p1").unwrap();
        assert!(!tmp.path().join("p1").exists());
    }

    #[test]
    fn test_windowsfilter_remover_leaves_no_staging_residue() {
        let (tmp, store) = layer_store_with("p1");
        WindowsFilterRemover.remove_layer(&store, "p1").unwrap();
        assert!(!tmp.path().join("p1").exists());
        assert!(!tmp.path().join("p1-removing").exists());
    }

    #[test]
    fn test_removing_a_missing_layer_fails() {
        let (_tmp, store) = layer_store_with("p1");
        assert!(RecursiveRemover.remove_layer(&store, "p9").is_err());
    }
}
