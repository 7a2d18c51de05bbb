//! Crate-level error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a snapshot as a whole.
///
/// Everything else (missing files, malformed content, degenerate rate windows)
/// degrades a single field and never surfaces here.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// A required pseudo-filesystem root is missing.
    #[error("unsupported platform: pseudo-filesystem root {} is not present", missing.display())]
    UnsupportedPlatform { missing: PathBuf },

    #[error("invalid collector configuration: {0}")]
    Config(String),
}
