//! Shared test utilities for the catmd test suite.
//!
//! Provides an in-memory [`FileSource`] for pipeline tests that do not need
//! a real directory, and a helper that writes a document tree to a temp
//! directory for those that do.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let files = MemoryFiles::new()
//!     .with_file("/docs/a.md", "# A\n\n[B](b.md)")
//!     .with_file("/docs/b.md", "# B");
//!
//! let tmp = write_tree(&[("a.md", "# A"), ("guide/b.md", "# B")]);
//! ```

use crate::files::FileSource;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// In-memory file system
// =========================================================================

/// Files keyed by absolute path. Directories exist implicitly as ancestors.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl FileSource for MemoryFiles {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.keys().any(|file| file.starts_with(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, content)` pairs to a fresh temp directory.
pub fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, content) in files {
        let path = tmp.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
    tmp
}
