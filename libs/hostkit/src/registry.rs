//! Catalog of module implementations linked into the host.
//!
//! Module crates submit a [`ModuleRegistration`] through `inventory` (usually
//! via [`register_module!`](crate::register_module)); the host collects them
//! into a [`ModuleCatalog`] at startup. Entry point manifests refer to catalog
//! entries by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::contracts::HostModule;

/// Creates a fresh module instance.
pub type ModuleFactory = Arc<dyn Fn() -> Box<dyn HostModule> + Send + Sync>;

/// Link-time registration of a module implementation.
pub struct ModuleRegistration {
    pub name: &'static str,
    pub factory: fn() -> Box<dyn HostModule>,
}

impl ModuleRegistration {
    #[must_use]
    pub const fn new(name: &'static str, factory: fn() -> Box<dyn HostModule>) -> Self {
        Self { name, factory }
    }
}

inventory::collect!(ModuleRegistration);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("module '{name}' is registered more than once")]
    DuplicateModule { name: String },
}

/// Name-indexed set of module factories.
#[derive(Default, Clone)]
pub struct ModuleCatalog {
    factories: BTreeMap<String, ModuleFactory>,
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every [`ModuleRegistration`] linked into the binary.
    ///
    /// # Errors
    /// Returns [`CatalogError::DuplicateModule`] if two registrations share a name.
    pub fn from_inventory() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for reg in inventory::iter::<ModuleRegistration> {
            let factory = reg.factory;
            catalog.register(reg.name, move || factory())?;
        }
        tracing::debug!(modules = ?catalog.names(), "module catalog collected");
        Ok(catalog)
    }

    /// Add a module factory under `name`.
    ///
    /// # Errors
    /// Returns [`CatalogError::DuplicateModule`] if `name` is already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), CatalogError>
    where
        F: Fn() -> Box<dyn HostModule> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(CatalogError::DuplicateModule { name });
        }
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Instantiate the module registered under `name`.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn HostModule>> {
        self.factories.get(name).map(|factory| factory())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Register a `Default`-constructible [`HostModule`] under a catalog name.
///
/// ```ignore
/// #[derive(Default)]
/// pub struct Greeter;
///
/// impl hostkit::HostModule for Greeter { /* ... */ }
///
/// hostkit::register_module!("greeter", Greeter);
/// ```
#[macro_export]
macro_rules! register_module {
    ($name:expr, $ty:ty) => {
        const _: () = {
            fn __hostkit_factory() -> ::std::boxed::Box<dyn $crate::contracts::HostModule> {
                ::std::boxed::Box::new(<$ty as ::std::default::Default>::default())
            }

            $crate::inventory::submit! {
                $crate::registry::ModuleRegistration::new($name, __hostkit_factory)
            }
        };
    };
}
