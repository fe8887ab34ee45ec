//! Module root path coercion.
//!
//! Configuration may name a single module root or an ordered list of them:
//!
//! ```yaml
//! modules:
//!   path: demos/modules
//! # or
//! modules:
//!   path: [vendor/modules, local/modules]
//! ```
//!
//! Both shapes deserialize into [`PathSpec`], which is flattened into an
//! ordered `Vec<PathBuf>` before discovery starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One path or an ordered list of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl PathSpec {
    /// Flatten into an ordered list. A list is returned as-is, a single path
    /// becomes a one-element list.
    #[must_use]
    pub fn normalize(self) -> Vec<PathBuf> {
        match self {
            PathSpec::One(path) => vec![path],
            PathSpec::Many(paths) => paths,
        }
    }

    /// Number of paths named.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PathSpec::One(_) => 1,
            PathSpec::Many(paths) => paths.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<PathBuf> for PathSpec {
    fn from(path: PathBuf) -> Self {
        PathSpec::One(path)
    }
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        PathSpec::One(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for PathSpec {
    fn from(paths: Vec<PathBuf>) -> Self {
        PathSpec::Many(paths)
    }
}

impl From<Vec<&str>> for PathSpec {
    fn from(paths: Vec<&str>) -> Self {
        PathSpec::Many(paths.into_iter().map(PathBuf::from).collect())
    }
}

/// Shorthand for `PathSpec::from(value).normalize()`.
pub fn normalize_paths(value: impl Into<PathSpec>) -> Vec<PathBuf> {
    value.into().normalize()
}
