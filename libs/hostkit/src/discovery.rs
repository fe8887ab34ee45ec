//! Module discovery over the filesystem.
//!
//! A directory is a module when it directly contains [`ENTRY_POINT`]. Discovery
//! walks each configured root depth-first and records entry points in
//! post-order: every module below a directory is found before the directory's
//! own entry point. Roots are walked in the order they were configured.
//!
//! Symlinked directories are followed, but a directory reached again through
//! another path (a symlink cycle or alias) is walked only once per root.
//! Missing or unreadable directories are skipped; they never abort the walk of
//! sibling roots.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Well-known file name that marks a directory as an activatable module.
pub const ENTRY_POINT: &str = "autoload.yaml";

/// A discovered module entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Path of the entry point file.
    pub path: PathBuf,
    /// Configured root this descriptor was found under.
    pub root: PathBuf,
}

impl ModuleDescriptor {
    /// Directory containing the entry point, i.e. the module's own directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Walks module roots and collects [`ModuleDescriptor`]s.
#[derive(Debug, Clone)]
pub struct ModuleDiscoverer {
    entry_point: String,
}

impl Default for ModuleDiscoverer {
    fn default() -> Self {
        Self {
            entry_point: ENTRY_POINT.to_owned(),
        }
    }
}

impl ModuleDiscoverer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different entry point file name.
    #[must_use]
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    #[must_use]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Discover descriptors under `roots`, in activation order.
    ///
    /// Within one root every directory is walked at most once, keyed by its
    /// canonical path, so symlink cycles terminate. Duplicate roots are walked
    /// again and produce duplicate descriptors.
    #[must_use]
    pub fn discover(&self, roots: &[PathBuf]) -> Vec<ModuleDescriptor> {
        let mut found = Vec::new();
        for root in roots {
            let before = found.len();
            let mut visited = HashSet::new();
            self.walk(root, root, &mut visited, &mut found);
            tracing::debug!(
                root = %root.display(),
                modules = found.len() - before,
                "module root scanned"
            );
        }
        found
    }

    fn walk(
        &self,
        root: &Path,
        dir: &Path,
        visited: &mut HashSet<PathBuf>,
        found: &mut Vec<ModuleDescriptor>,
    ) {
        // Missing directories fail to canonicalize; `list_subdirs` reports them.
        if let Ok(canonical) = fs::canonicalize(dir)
            && !visited.insert(canonical)
        {
            tracing::debug!(dir = %dir.display(), "directory already walked under this root, skipping");
            return;
        }

        for child in list_subdirs(dir) {
            self.walk(root, &child, visited, found);
        }

        let candidate = dir.join(&self.entry_point);
        if candidate.is_file() {
            tracing::trace!(path = %candidate.display(), "entry point found");
            found.push(ModuleDescriptor {
                path: candidate,
                root: root.to_path_buf(),
            });
        }
    }
}

/// Immediate, non-hidden subdirectories of `dir`, sorted by file name.
/// Returns an empty list when `dir` cannot be read.
fn list_subdirs(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "module directory does not exist, skipping");
            return Vec::new();
        }
        Err(e) => {
            if dir.is_dir() {
                tracing::warn!(dir = %dir.display(), error = %e, "module directory unreadable, skipping");
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Discover with the default entry point name.
#[must_use]
pub fn discover_modules(roots: &[PathBuf]) -> Vec<ModuleDescriptor> {
    ModuleDiscoverer::new().discover(roots)
}
