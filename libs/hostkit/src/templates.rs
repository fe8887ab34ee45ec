//! Template rendering over namespaced template roots.
//!
//! Templates are addressed as `@namespace/relative/path`; the namespace part is
//! resolved through the host's [`NamespaceRegistry`] at render time, so a
//! rebinding takes effect for the next render.

use std::path::PathBuf;
use std::sync::Arc;

use crate::namespaces::{NamespaceRegistry, split_namespaced};

pub use tera::Context as TemplateContext;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template name '{0}' is not of the form @namespace/path")]
    InvalidName(String),
    #[error("no namespace '{namespace}' is registered")]
    UnknownNamespace { namespace: String },
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

/// Cheap-to-clone handle for rendering namespaced templates.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    namespaces: Arc<NamespaceRegistry>,
    autoescape: bool,
}

impl TemplateEngine {
    #[must_use]
    pub fn new(namespaces: Arc<NamespaceRegistry>, autoescape: bool) -> Self {
        Self {
            namespaces,
            autoescape,
        }
    }

    #[must_use]
    pub fn autoescape(&self) -> bool {
        self.autoescape
    }

    /// File backing the template `name`.
    ///
    /// # Errors
    /// Returns [`TemplateError::InvalidName`] or [`TemplateError::UnknownNamespace`].
    pub fn locate(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let (namespace, rel) =
            split_namespaced(name).ok_or_else(|| TemplateError::InvalidName(name.to_owned()))?;
        let root = self
            .namespaces
            .resolve(namespace)
            .ok_or_else(|| TemplateError::UnknownNamespace {
                namespace: namespace.to_owned(),
            })?;
        Ok(root.join(rel))
    }

    /// Render the template `name` with `context`.
    ///
    /// # Errors
    /// Returns a [`TemplateError`] if the template cannot be located, read or rendered.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        let path = self.locate(name)?;
        let source = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        tera::Tera::one_off(&source, context, self.autoescape).map_err(|source| {
            TemplateError::Render {
                name: name.to_owned(),
                source,
            }
        })
    }
}
