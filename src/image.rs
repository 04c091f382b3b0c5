//! Image config parsing and the image reference walk.
//!
//! Every file under `image/<driver>/imagedb/content/sha256/` is one image
//! config. The audit consumes two of its fields: the ordered `diff_ids`
//! chain under `rootfs`, and the `os` tag. Each hash in the chain must
//! resolve through the metadata index to a raw layer; a hash or layer that
//! fails to resolve means the runtime's own data is internally broken, and
//! the audit cannot reason past that.

use log::debug;
use serde::Deserialize;

use crate::error::{AuditError, Result};
use crate::layerdb::LayerDbIndex;
use crate::raw::RawLayerInventory;
use crate::store::Store;

/// On-disk image config, reduced to the fields the audit consumes.
/// Everything else in the file is ignored.
#[derive(Debug, Deserialize)]
pub struct ImageConfig {
    /// Root filesystem descriptor; absent for images with no layers.
    #[serde(default)]
    pub rootfs: Option<RootFs>,

    /// Platform tag. Absent means native.
    #[serde(default)]
    pub os: Option<String>,
}

/// The root filesystem descriptor of an image config.
#[derive(Debug, Deserialize)]
pub struct RootFs {
    /// Descriptor type, `"layers"` in practice.
    #[serde(rename = "type", default)]
    pub fs_type: String,

    /// Ordered chain of layer content hashes.
    #[serde(default)]
    pub diff_ids: Vec<String>,
}

/// Walk every image config and mark the records and raw layers its chain
/// resolves to.
///
/// Images whose `os` tag is foreign to the audited driver family are
/// skipped whole: their chains live in a different layer namespace and
/// must not be resolved here.
///
/// # Errors
///
/// Returns an error if the image store cannot be listed, a config cannot be
/// read or parsed, or any chain hash fails to resolve to a record and then
/// to a raw layer.
pub fn walk_images(
    store: &Store,
    index: &mut LayerDbIndex,
    inventory: &mut RawLayerInventory,
) -> Result<()> {
    let read_err = |e| AuditError::Read {
        path: store.imagedb_path(),
        source: e,
    };

    for entry in store.imagedb_dir().entries().map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        // Image configs are files; anything else in here is not an image.
        if entry.file_type().map_err(read_err)?.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        walk_image(store, &name, index, inventory)?;
    }

    Ok(())
}

/// Resolve one image's layer chain and mark everything it references.
fn walk_image(
    store: &Store,
    name: &str,
    index: &mut LayerDbIndex,
    inventory: &mut RawLayerInventory,
) -> Result<()> {
    let file = store.imagedb_dir().open(name).map_err(|e| AuditError::Read {
        path: store.imagedb_path().join(name),
        source: e,
    })?;
    let config: ImageConfig =
        serde_json::from_reader(file).map_err(|e| AuditError::ManifestParse {
            path: store.imagedb_path().join(name),
            source: e,
        })?;

    if let Some(os) = config.os.as_deref() {
        if store.driver().is_foreign_os(os) {
            debug!("image {name} targets {os}; skipping its chain");
            return Ok(());
        }
    }

    let Some(rootfs) = &config.rootfs else {
        debug!("image {name} has no rootfs descriptor");
        return Ok(());
    };

    for diff_id in &rootfs.diff_ids {
        let record = index
            .mark_reachable(diff_id)
            .ok_or_else(|| AuditError::UnknownDiffId {
                image: name.to_string(),
                diff_id: diff_id.clone(),
            })?;
        let record_id = record.id().to_string();
        let cache_id = record.cache_id().to_string();

        if !inventory.mark_reachable(&cache_id) {
            return Err(AuditError::MissingRawLayer {
                record: record_id,
                cache_id,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: ImageConfig = serde_json::from_str(
            r#"{
                "architecture": "amd64",
                "os": "linux",
                "config": { "Cmd": ["/bin/sh"] },
                "rootfs": {
                    "type": "layers",
                    "diff_ids": [
                        "sha256:aaaa",
                        "sha256:bbbb"
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.os.as_deref(), Some("linux"));
        let rootfs = config.rootfs.unwrap();
        assert_eq!(rootfs.fs_type, "layers");
        assert_eq!(rootfs.diff_ids, ["sha256:aaaa", "sha256:bbbb"]);
    }

    #[test]
    fn test_parse_config_without_rootfs() {
        let config: ImageConfig = serde_json::from_str(r#"{ "os": "linux" }"#).unwrap();
        assert!(config.rootfs.is_none());
    }

    #[test]
    fn test_config_must_be_json() {
        assert!(serde_json::from_str::<ImageConfig>("not json").is_err());
    }
}
