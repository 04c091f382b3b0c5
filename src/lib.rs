//! Offline leak audit for a container runtime's layer store.
//!
//! This library rebuilds the reference graph between image configs, layer
//! metadata records, and raw on-disk layer directories, marks everything
//! reachable from an image or a container, and reports what is left over.
//! It runs against a snapshot of the runtime's data directory and never
//! repairs anything: a dangling reference is a fatal consistency error,
//! not something to reconcile.
//!
//! # Store Layout
//!
//! The audited data root follows the engine's graph-driver layout, with the
//! driver family name substituted for `<driver>`:
//!
//! ```text
//! /var/lib/docker/
//! +-- image/<driver>/
//! |   +-- imagedb/content/sha256/
//! |   |   +-- <image-id>           # image config (JSON), one file per image
//! |   +-- layerdb/sha256/
//! |       +-- <record-id>/
//! |           +-- diff             # content hash of the layer
//! |           +-- cache-id         # raw layer this record maps to
//! +-- <driver>/
//! |   +-- <raw-layer-id>/          # one directory per physical layer
//! |   +-- l/                       # overlay short-link dir (never a layer)
//! +-- containers/
//!     +-- <container-id>/          # name equals the writable layer's id
//! ```
//!
//! # Reference Graph
//!
//! Two kinds of references keep an entity alive:
//!
//! - `image -(diff_id)-> layer record -(cache-id)-> raw layer`
//! - `container -(directory name)-> raw layer`
//!
//! The audit builds both inventories, walks images and then containers, and
//! sweeps: any record or raw layer without a mark is a leak. An image whose
//! `os` belongs to a foreign platform family (e.g. a linux image held by a
//! windowsfilter store) is skipped whole, with none of its chain resolved.
//!
//! # Concurrency
//!
//! The whole audit is a single synchronous pass. There is no locking against
//! a live runtime: scanning a store that is being mutated may produce false
//! leak reports or false consistency errors, and that is the caller's
//! responsibility to avoid.

pub mod audit;
pub mod container;
pub mod driver;
pub mod error;
pub mod image;
pub mod layerdb;
pub mod raw;
pub mod remove;
pub mod store;

pub use audit::{audit, remove_leaked, AuditReport, RemovalSummary};
pub use container::walk_containers;
pub use driver::DriverFamily;
pub use error::{AuditError, Result};
pub use image::{walk_images, ImageConfig, RootFs};
pub use layerdb::{LayerDbIndex, LayerRecord};
pub use raw::{RawLayer, RawLayerInventory};
pub use remove::{LayerRemover, RecursiveRemover, WindowsFilterRemover};
pub use store::Store;
