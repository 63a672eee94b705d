//! File system access.
//!
//! The [`FileSource`] trait is the only way the pipeline reads files or asks
//! whether a path exists. The production implementation is [`OsFiles`]; tests
//! substitute an in-memory tree so traversal and assembly can be exercised
//! without touching disk.

use std::io;
use std::path::Path;

/// Read access to documents on some file system.
pub trait FileSource {
    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whether anything (file or directory) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFiles;

impl FileSource for OsFiles {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}
