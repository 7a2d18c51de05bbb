//! Raw source reader.
//!
//! Wraps a [`FileSystem`] so that every read either yields content or is
//! absent. Callers never see an I/O error: a missing file, a permission
//! problem, or a device unplugged between listing and reading all look the same.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::trace;

use crate::collector::traits::FileSystem;

/// Fallible-to-absent view over a filesystem.
#[derive(Debug, Clone)]
pub struct SourceReader<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> SourceReader<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Returns the underlying filesystem.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Reads a whole file as text.
    pub fn read_string(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = path.as_ref();
        match self.fs.read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "source absent");
                None
            }
        }
    }

    /// Reads a whole file as raw bytes.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = path.as_ref();
        match self.fs.read(path) {
            Ok(content) => Some(content),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "binary source absent");
                None
            }
        }
    }

    /// Reads a single-value attribute, trimmed. Empty content counts as absent.
    pub fn read_trimmed(&self, path: impl AsRef<Path>) -> Option<String> {
        let value = self.read_string(path)?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Reads a single-value attribute and parses it.
    pub fn read_parsed<T: FromStr>(&self, path: impl AsRef<Path>) -> Option<T> {
        let path = path.as_ref();
        let value = self.read_trimmed(path)?;
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                trace!(path = %path.display(), value = %value, "unparsable attribute");
                None
            }
        }
    }

    /// Reads a whitespace-separated list attribute, e.g. available governors.
    pub fn read_words(&self, path: impl AsRef<Path>) -> Vec<String> {
        self.read_string(path)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.fs.exists(path.as_ref())
    }

    /// Lists the entry names of a directory, sorted.
    ///
    /// Sorting makes "first match wins" discovery deterministic.
    pub fn list_entries(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let dir = dir.as_ref();
        let mut names: Vec<String> = match self.fs.read_dir(dir) {
            Ok(entries) => entries
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                trace!(dir = %dir.display(), error = %e, "directory absent");
                Vec::new()
            }
        };
        names.sort();
        names
    }

    /// Lists entry names together with their full paths.
    pub fn list_paths(&self, dir: impl AsRef<Path>) -> Vec<(String, PathBuf)> {
        let dir = dir.as_ref();
        self.list_entries(dir)
            .into_iter()
            .map(|name| {
                let path = dir.join(&name);
                (name, path)
            })
            .collect()
    }
}
