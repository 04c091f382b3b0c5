//! Error types for the leak audit.
//!
//! Every failure class here is fatal: the audit has no retry or
//! partial-result mode, so the first structural, I/O, parse, or consistency
//! error aborts the whole pass. Leak findings are *results*, not errors,
//! and are reported through [`AuditReport`](crate::audit::AuditReport).

use std::path::PathBuf;

/// Result type alias for operations that may return an AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Error types for audit operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The runtime data root was not found at the specified path.
    #[error("data root not found at {}", .0.display())]
    RootNotFound(PathBuf),

    /// A required store directory is missing under the data root.
    #[error("incorrect folder structure: expected {} to exist", .0.display())]
    MissingStoreDir(PathBuf),

    /// A directory could not be listed or a per-record file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An image config file is not valid JSON.
    #[error("failed to read JSON contents of {}: {source}", path.display())]
    ManifestParse {
        /// Path of the malformed image config.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// An image names a content hash with no layer metadata record.
    #[error("image {image} expects a layer record with diff id {diff_id}")]
    UnknownDiffId {
        /// Image config file name.
        image: String,
        /// Content hash with no matching record.
        diff_id: String,
    },

    /// A layer metadata record names an on-disk layer that does not exist.
    #[error("layer record {record} expects on-disk layer {cache_id}")]
    MissingRawLayer {
        /// Metadata record id.
        record: String,
        /// Raw layer id the record maps to.
        cache_id: String,
    },

    /// I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
