//! Namespaced resource roots.
//!
//! Modules bind a namespace key to a directory of their own (typically
//! templates). Resources are then addressed as `@key/relative/path`, so two
//! modules shipping a `layout.html` never collide.
//!
//! Keys are opaque and chosen by the registering module. Registering a key that
//! is already bound replaces the previous binding.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Prefix marking a namespaced resource name.
pub const NAMESPACE_PREFIX: char = '@';

/// Namespace key → resource root bindings.
#[derive(Debug, Default)]
pub struct NamespaceRegistry {
    bindings: RwLock<BTreeMap<String, PathBuf>>,
}

impl NamespaceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `root`. Last write wins.
    pub fn register(&self, key: impl Into<String>, root: impl Into<PathBuf>) {
        let key = key.into();
        let root = root.into();
        let previous = self.bindings.write().insert(key.clone(), root.clone());
        match previous {
            Some(old) if old != root => tracing::warn!(
                namespace = %key,
                previous = %old.display(),
                current = %root.display(),
                "namespace re-registered, previous binding replaced"
            ),
            _ => tracing::debug!(namespace = %key, root = %root.display(), "namespace registered"),
        }
    }

    /// Root currently bound to `key`.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<PathBuf> {
        self.bindings.read().get(key).cloned()
    }

    /// Snapshot of all bindings, sorted by key.
    #[must_use]
    pub fn bindings(&self) -> Vec<(String, PathBuf)> {
        self.bindings
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Resolve `@key/relative/path` to a file path under the bound root.
    ///
    /// Returns `None` for names without a namespace, unknown keys, and relative
    /// paths that would escape the root.
    #[must_use]
    pub fn resolve_resource(&self, name: &str) -> Option<PathBuf> {
        let (key, rel) = split_namespaced(name)?;
        let root = self.resolve(key)?;
        Some(root.join(rel))
    }
}

/// Split `@key/rel` into `(key, rel)`; rejects empty parts and `..`/absolute paths.
pub(crate) fn split_namespaced(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(NAMESPACE_PREFIX)?;
    let (key, rel) = rest.split_once('/')?;
    if key.is_empty() || rel.is_empty() {
        return None;
    }
    let contained = Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    contained.then_some((key, rel))
}
