//! Opened handle bundle for one runtime data root.
//!
//! [`Store::open`] performs the structural preflight: all four store
//! directories the audit consumes must exist before any scanning begins.
//! After the preflight, every read goes through the retained
//! [`cap_std::fs::Dir`] handles, so the audit never re-resolves paths under
//! a root that could be swapped out from underneath it. Display paths are
//! kept separately for error messages.

use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::driver::DriverFamily;
use crate::error::{AuditError, Result};

/// An opened runtime data root, validated for the audited driver family.
#[derive(Debug)]
pub struct Store {
    /// Data root path, used only for reporting.
    root: PathBuf,

    /// Driver family whose stores are audited.
    driver: DriverFamily,

    /// image/\<driver\>/imagedb/content/sha256, one config file per image.
    imagedb: Dir,

    /// image/\<driver\>/layerdb/sha256, one directory per metadata record.
    layerdb: Dir,

    /// \<driver\>, one directory per raw physical layer.
    layers: Dir,

    /// containers, one directory per container instance.
    containers: Dir,
}

impl Store {
    /// Open a data root and verify the store structure for `driver`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::RootNotFound`] if the root itself is absent and
    /// [`AuditError::MissingStoreDir`] naming the first required store
    /// directory that is missing. Any other I/O failure is returned as-is.
    pub fn open<P: AsRef<Path>>(root: P, driver: DriverFamily) -> Result<Self> {
        let root_path = root.as_ref().to_path_buf();

        let root_dir = Dir::open_ambient_dir(&root_path, ambient_authority()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuditError::RootNotFound(root_path.clone())
            } else {
                AuditError::Io(e)
            }
        })?;

        let imagedb_rel = format!("image/{}/imagedb/content/sha256", driver.dir_name());
        let layerdb_rel = format!("image/{}/layerdb/sha256", driver.dir_name());

        let imagedb = Self::open_store_dir(&root_dir, &root_path, &imagedb_rel)?;
        let layerdb = Self::open_store_dir(&root_dir, &root_path, &layerdb_rel)?;
        let layers = Self::open_store_dir(&root_dir, &root_path, driver.dir_name())?;
        let containers = Self::open_store_dir(&root_dir, &root_path, "containers")?;

        Ok(Self {
            root: root_path,
            driver,
            imagedb,
            layerdb,
            layers,
            containers,
        })
    }

    /// Open one required store directory, mapping absence to a structural error.
    fn open_store_dir(root_dir: &Dir, root_path: &Path, rel: &str) -> Result<Dir> {
        root_dir.open_dir(rel).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuditError::MissingStoreDir(root_path.join(rel))
            } else {
                AuditError::Io(e)
            }
        })
    }

    /// The data root this store was opened at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The driver family being audited.
    pub fn driver(&self) -> DriverFamily {
        self.driver
    }

    /// Handle for the image config store.
    pub fn imagedb_dir(&self) -> &Dir {
        &self.imagedb
    }

    /// Handle for the layer metadata store.
    pub fn layerdb_dir(&self) -> &Dir {
        &self.layerdb
    }

    /// Handle for the raw layer store.
    pub fn layer_dir(&self) -> &Dir {
        &self.layers
    }

    /// Handle for the container store.
    pub fn container_dir(&self) -> &Dir {
        &self.containers
    }

    /// Display path of the image config store.
    pub fn imagedb_path(&self) -> PathBuf {
        self.root
            .join("image")
            .join(self.driver.dir_name())
            .join("imagedb")
            .join("content")
            .join("sha256")
    }

    /// Display path of the layer metadata store.
    pub fn layerdb_path(&self) -> PathBuf {
        self.root
            .join("image")
            .join(self.driver.dir_name())
            .join("layerdb")
            .join("sha256")
    }

    /// Display path of the raw layer store.
    pub fn layer_path(&self) -> PathBuf {
        self.root.join(self.driver.dir_name())
    }

    /// Display path of the container store.
    pub fn container_path(&self) -> PathBuf {
        self.root.join("containers")
    }
}
