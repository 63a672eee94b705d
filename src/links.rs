//! Link classification and path resolution.
//!
//! Every link destination is either **internal**, a relative path that
//! resolves to a file inside the scope directory, or **external**, which is
//! everything else and is never followed or rewritten.
//!
//! ## Rules
//!
//! Applied in order:
//!
//! 1. Scheme-qualified (`https:`, `mailto:`, ...) → external
//! 2. Fragment-only (`#section`) → external (a same-document anchor)
//! 3. Absolute filesystem path (`/etc/notes.md`) → external
//! 4. Otherwise the fragment is stripped, the rest is percent-decoded and
//!    resolved against the linking document's directory. The result is
//!    internal only if it lies at or below the scope directory.
//!
//! A destination that is empty once the fragment is removed is an error, not
//! a classification.
//!
//! Paths are canonicalized lexically: `.` and `..` are folded without touching
//! the file system, so links to files that do not exist still resolve.

use crate::files::FileSource;
use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("link destination {0:?} is empty after removing the fragment")]
    EmptyDestination(String),
    #[error("cannot resolve {destination:?} to an absolute path: {reason}")]
    Unresolvable { destination: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RootError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("root file {0} does not exist")]
    NotFound(PathBuf),
    #[error("root file {0} is a directory, not a file")]
    NotAFile(PathBuf),
    #[error("root file {0} is not a markdown file")]
    UnsupportedExtension(PathBuf),
    #[error("scope directory {0} does not exist")]
    ScopeNotFound(PathBuf),
    #[error("scope path {0} is not a directory")]
    ScopeNotADirectory(PathBuf),
}

/// The directory subtree whose files are eligible for inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBoundary {
    dir: PathBuf,
}

impl ScopeBoundary {
    /// Canonicalize `dir` and use it as the boundary.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            dir: canonical(dir)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Whether a canonical path is equal to or nested under the boundary.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }
}

/// Outcome of classifying a link destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    Internal(InternalTarget),
    External,
}

/// Where an internal link points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTarget {
    /// Canonical absolute path of the target document.
    pub path: PathBuf,
    /// Fragment suffix as written, `#` included.
    pub fragment: Option<String>,
}

/// Classify a link destination found in the document at `current`.
pub fn classify(
    destination: &str,
    current: &Path,
    scope: &ScopeBoundary,
) -> Result<LinkClass, LinkError> {
    if has_scheme(destination) || destination.starts_with('#') {
        return Ok(LinkClass::External);
    }
    if destination.starts_with('/') || Path::new(destination).is_absolute() {
        return Ok(LinkClass::External);
    }

    let (path_part, fragment) = split_fragment(destination);
    if path_part.is_empty() {
        return Err(LinkError::EmptyDestination(destination.to_string()));
    }

    let decoded = percent_decode_str(path_part).decode_utf8_lossy();
    let base = current.parent().unwrap_or(Path::new(""));
    let resolved = canonical(base.join(decoded.as_ref())).map_err(|err| LinkError::Unresolvable {
        destination: destination.to_string(),
        reason: err.to_string(),
    })?;

    if !scope.contains(&resolved) {
        return Ok(LinkClass::External);
    }

    Ok(LinkClass::Internal(InternalTarget {
        path: resolved,
        fragment: fragment.map(str::to_string),
    }))
}

/// Whether a destination starts with a URI scheme (`scheme:`).
///
/// Single-letter prefixes are not schemes so `C:` drive paths stay paths.
pub fn has_scheme(destination: &str) -> bool {
    let Some((scheme, _)) = destination.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split a destination at its first `#`. The fragment keeps its `#`.
pub fn split_fragment(destination: &str) -> (&str, Option<&str>) {
    match destination.find('#') {
        Some(i) => (&destination[..i], Some(&destination[i..])),
        None => (destination, None),
    }
}

/// Make a path absolute and fold `.` and `..` components.
pub fn canonical(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    Ok(normalize_path(&std::path::absolute(path)?))
}

/// Fold `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` has one of the given extensions (case-insensitive, no dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Check that the root document can start a run and return its canonical path.
pub fn validate_root(
    root: &Path,
    files: &impl FileSource,
    extensions: &[String],
) -> Result<PathBuf, RootError> {
    let path = canonical(root)?;
    if !files.exists(&path) {
        return Err(RootError::NotFound(path));
    }
    if !files.is_file(&path) {
        return Err(RootError::NotAFile(path));
    }
    if !has_extension(&path, extensions) {
        return Err(RootError::UnsupportedExtension(path));
    }
    Ok(path)
}

/// The scope directory: `explicit` if given, otherwise the root's directory.
pub fn determine_scope(
    root: &Path,
    explicit: Option<&Path>,
    files: &impl FileSource,
) -> Result<ScopeBoundary, RootError> {
    match explicit {
        Some(dir) => {
            let scope = ScopeBoundary::new(dir)?;
            if !files.exists(scope.path()) {
                return Err(RootError::ScopeNotFound(scope.dir));
            }
            if files.is_file(scope.path()) {
                return Err(RootError::ScopeNotADirectory(scope.dir));
            }
            Ok(scope)
        }
        None => {
            let root = canonical(root)?;
            let dir = root.parent().unwrap_or(Path::new("/"));
            Ok(ScopeBoundary::new(dir)?)
        }
    }
}
