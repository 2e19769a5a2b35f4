//! Shared types for arbor
//!
//! This crate provides the path identifier types used across the arbor
//! ecosystem. A [`NodePath`] names a location in the source tree (a leaf
//! document or a directory) and is the map key everywhere; an
//! [`AssetPath`] names a non-document file referenced from a document.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path of a document or directory in the source tree.
///
/// The same type deliberately covers both: a directory's identity in the
/// node map is its index document, and callers switch between the two with
/// [`NodePath::index_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(pub PathBuf);

impl NodePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// File name without its extension; empty for paths without one.
    pub fn stem(&self) -> &str {
        self.0
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Whether this path names an index document (`.../index.md`).
    pub fn is_index(&self) -> bool {
        self.stem() == "index"
    }

    /// The index document path for a directory: `self/index.md`.
    pub fn index_path(&self) -> NodePath {
        NodePath(self.0.join("index.md"))
    }

    /// Path relative to `root`, as a string. Falls back to the full path
    /// when `root` is not a prefix.
    pub fn relative_to(&self, root: &Path) -> String {
        self.0
            .strip_prefix(root)
            .unwrap_or(&self.0)
            .to_string_lossy()
            .to_string()
    }

    /// Public href stem: the path relative to `root` with the extension
    /// stripped. `root/a/b/file.md` becomes `a/b/file`.
    pub fn href_stem(&self, root: &Path) -> String {
        let rel = self.0.strip_prefix(root).unwrap_or(&self.0);
        rel.with_extension("").to_string_lossy().to_string()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for NodePath {
    fn from(path: PathBuf) -> Self {
        NodePath(path)
    }
}

impl AsRef<Path> for NodePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Path of a linked or embedded asset (image, font, plain file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetPath(pub PathBuf);

impl AssetPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}
