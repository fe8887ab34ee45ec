//! Module activation.
//!
//! Descriptors are activated strictly in the order given, one at a time. Each
//! activation reads the entry point manifest, instantiates the named module from
//! the [`ModuleCatalog`] and runs its registration against the [`HostContext`].
//!
//! The first failure stops activation: later descriptors are never touched and
//! the error is returned to the caller, which is expected to abort startup.
//! A partially activated module set is not a valid running state.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::context::{ActivatedModule, HostContext, ModuleCtx};
use crate::discovery::ModuleDescriptor;
use crate::manifest::ModuleManifest;
use crate::registry::ModuleCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("invalid module manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("module '{module}' declared by {} is not linked into this host", path.display())]
    UnknownModule { module: String, path: PathBuf },

    #[error("module '{module}' ({}) failed to register: {source:#}", path.display())]
    Registration {
        module: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Result of a single [`ModuleActivator::activate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The module's registration ran.
    Activated,
    /// This entry point was activated before; nothing ran.
    AlreadyActive,
}

/// Runs each entry point at most once.
#[derive(Debug)]
pub struct ModuleActivator {
    catalog: ModuleCatalog,
    seen: HashSet<PathBuf>,
}

impl ModuleActivator {
    #[must_use]
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            seen: HashSet::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Activate `descriptors` in order.
    ///
    /// Returns the number of modules whose registration ran in this call.
    ///
    /// # Errors
    /// Returns the first [`ActivationError`]; remaining descriptors are not activated.
    pub fn activate_all(
        &mut self,
        descriptors: &[ModuleDescriptor],
        host: &mut HostContext,
    ) -> Result<usize, ActivationError> {
        let mut activated = 0;
        for descriptor in descriptors {
            if self.activate(descriptor, host)? == Activation::Activated {
                activated += 1;
            }
        }
        Ok(activated)
    }

    /// Activate a single descriptor unless its entry point already ran.
    ///
    /// # Errors
    /// Returns an [`ActivationError`] if the manifest is invalid, names a module the
    /// catalog does not know, or the module's registration fails.
    pub fn activate(
        &mut self,
        descriptor: &ModuleDescriptor,
        host: &mut HostContext,
    ) -> Result<Activation, ActivationError> {
        let key = fs::canonicalize(&descriptor.path).unwrap_or_else(|_| descriptor.path.clone());
        if self.seen.contains(&key) {
            tracing::debug!(path = %descriptor.path.display(), "entry point already activated, skipping");
            return Ok(Activation::AlreadyActive);
        }

        let manifest =
            ModuleManifest::load(&descriptor.path).map_err(|e| ActivationError::Manifest {
                path: descriptor.path.clone(),
                source: Box::new(e),
            })?;

        let instance = self.catalog.instantiate(&manifest.module).ok_or_else(|| {
            ActivationError::UnknownModule {
                module: manifest.module.clone(),
                path: descriptor.path.clone(),
            }
        })?;

        // Marked before registering: a failed entry point is never retried.
        self.seen.insert(key);

        tracing::info!(
            module = %manifest.module,
            dir = %descriptor.dir().display(),
            "activating module"
        );

        {
            let mut ctx =
                ModuleCtx::new(host, &manifest.module, descriptor, manifest.config.as_ref());
            instance
                .register(&mut ctx)
                .map_err(|source| ActivationError::Registration {
                    module: manifest.module.clone(),
                    path: descriptor.path.clone(),
                    source,
                })?;
        }

        host.record_activation(ActivatedModule {
            name: manifest.module,
            descriptor: descriptor.clone(),
            instance,
        });
        Ok(Activation::Activated)
    }
}
