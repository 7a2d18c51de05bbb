//! In-memory mock filesystem for testing collectors without real `/proc` and `/sys`.
//!
//! This module provides `MockFs` which simulates a filesystem in memory,
//! allowing tests to run on macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory filesystem for testing.
///
/// Files hold one or more versions of their content. Each read returns the
/// next version and the last one repeats forever, which lets a test feed two
/// different counter samples to a delta sampler.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to successive file contents.
    files: HashMap<PathBuf, Vec<Vec<u8>>>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Read counters per path, shared between clones.
    reads: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.add_versions(path, vec![content.into().into_bytes()]);
    }

    /// Adds a binary file.
    pub fn add_binary(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_versions(path, vec![content.into()]);
    }

    /// Adds a file whose content changes on every read.
    ///
    /// The first read returns `versions[0]`, the second `versions[1]` and so on;
    /// once exhausted the last version is returned.
    pub fn add_file_sequence<I, S>(&mut self, path: impl AsRef<Path>, versions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let versions = versions
            .into_iter()
            .map(|v| v.into().into_bytes())
            .collect();
        self.add_versions(path, versions);
    }

    fn add_versions(&mut self, path: impl AsRef<Path>, versions: Vec<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, versions);
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file or a whole directory subtree.
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.files.retain(|p, _| !p.starts_with(path));
        self.directories.retain(|p| !p.starts_with(path));
    }

    /// Returns how many times a path has been read.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let reads = self.reads.lock().unwrap_or_else(|e| e.into_inner());
        reads.get(path.as_ref()).copied().unwrap_or(0)
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    fn next_version(&self, path: &Path) -> io::Result<Vec<u8>> {
        let versions = self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })?;

        let mut reads = self.reads.lock().unwrap_or_else(|e| e.into_inner());
        let count = reads.entry(path.to_path_buf()).or_insert(0);
        let idx = (*count).min(versions.len().saturating_sub(1));
        *count += 1;

        Ok(versions.get(idx).cloned().unwrap_or_default())
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.next_version(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.next_version(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
