use anyhow::Context;
use axum::Router;
use axum::routing::MethodRouter;
use serde::de::DeserializeOwned;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::panic_message;

use crate::client_hub::ServiceHub;
use crate::contracts::HostModule;
use crate::discovery::ModuleDescriptor;
use crate::namespaces::NamespaceRegistry;
use crate::templates::TemplateEngine;

/// Host-wide settings fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct HostOptions {
    /// Expose panic messages in error responses.
    pub debug: bool,
    /// HTML-escape template output.
    pub autoescape: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            debug: false,
            autoescape: true,
        }
    }
}

/// A module that completed registration.
pub struct ActivatedModule {
    pub name: String,
    pub descriptor: ModuleDescriptor,
    pub(crate) instance: Box<dyn HostModule>,
}

impl std::fmt::Debug for ActivatedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivatedModule")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl ActivatedModule {
    /// The live module instance.
    #[must_use]
    pub fn instance(&self) -> &dyn HostModule {
        &*self.instance
    }
}

/// The shared host object modules register themselves against.
///
/// Exactly one exists per process; it is owned by the application and lent to
/// each module for the duration of its registration call. It owns:
/// - **Routes**: the router under construction
/// - **Namespaces**: `@key/...` resource roots, also used by the template engine
/// - **Services**: the [`ServiceHub`] for inter-module APIs
/// - **Activation record**: every module that registered successfully, in order
pub struct HostContext {
    router: Router,
    namespaces: Arc<NamespaceRegistry>,
    templates: TemplateEngine,
    services: Arc<ServiceHub>,
    activated: Vec<ActivatedModule>,
    options: HostOptions,
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("namespaces", &self.namespaces)
            .field("services", &self.services)
            .field("activated", &self.activated)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(HostOptions::default())
    }
}

impl HostContext {
    #[must_use]
    pub fn new(options: HostOptions) -> Self {
        let namespaces = Arc::new(NamespaceRegistry::new());
        let templates = TemplateEngine::new(namespaces.clone(), options.autoescape);
        Self {
            router: Router::new(),
            namespaces,
            templates,
            services: Arc::new(ServiceHub::new()),
            activated: Vec::new(),
            options,
        }
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> HostOptions {
        self.options
    }

    /// Bind namespace `name` to `path`. Last write wins.
    pub fn register_namespace(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.namespaces.register(name, path);
    }

    #[inline]
    #[must_use]
    pub fn namespaces(&self) -> &Arc<NamespaceRegistry> {
        &self.namespaces
    }

    #[inline]
    #[must_use]
    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    #[inline]
    #[must_use]
    pub fn services(&self) -> &Arc<ServiceHub> {
        &self.services
    }

    /// Add a route to the host router.
    ///
    /// # Errors
    /// Returns an error if `path` is invalid or the route overlaps one already
    /// registered; the router is left unchanged.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> anyhow::Result<()> {
        self.update_router(|router| router.route(path, method_router))
            .with_context(|| format!("cannot register route {path}"))
    }

    /// Merge a module's own router into the host router.
    ///
    /// # Errors
    /// Returns an error if a merged route overlaps one already registered; the
    /// router is left unchanged.
    pub fn merge(&mut self, router: Router) -> anyhow::Result<()> {
        self.update_router(|current| current.merge(router))
            .context("cannot merge module router")
    }

    // axum reports route conflicts by panicking; turn that into an error and
    // keep the previous router.
    fn update_router(&mut self, op: impl FnOnce(Router) -> Router) -> anyhow::Result<()> {
        let current = self.router.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| op(current))) {
            Ok(router) => {
                self.router = router;
                Ok(())
            }
            Err(payload) => Err(anyhow::anyhow!(
                "{}",
                panic_message(&*payload).unwrap_or("router rejected the route")
            )),
        }
    }

    /// Modules activated so far, in activation order.
    #[must_use]
    pub fn activated_modules(&self) -> &[ActivatedModule] {
        &self.activated
    }

    pub(crate) fn record_activation(&mut self, module: ActivatedModule) {
        self.activated.push(module);
    }

    /// Finish the host: the router with error handling installed.
    #[must_use]
    pub fn into_router(self) -> Router {
        crate::api::install_error_handling(self.router, self.options.debug)
    }
}

/// Per-activation view of the host, handed to [`HostModule::register`].
pub struct ModuleCtx<'a> {
    host: &'a mut HostContext,
    module_name: &'a str,
    descriptor: &'a ModuleDescriptor,
    config: Option<&'a serde_json::Value>,
}

impl<'a> ModuleCtx<'a> {
    pub fn new(
        host: &'a mut HostContext,
        module_name: &'a str,
        descriptor: &'a ModuleDescriptor,
        config: Option<&'a serde_json::Value>,
    ) -> Self {
        Self {
            host,
            module_name,
            descriptor,
            config,
        }
    }

    // ---- public read-only API for modules ----

    #[inline]
    #[must_use]
    pub fn module_name(&self) -> &str {
        self.module_name
    }

    /// Directory holding the module's entry point.
    #[inline]
    #[must_use]
    pub fn module_dir(&self) -> &Path {
        self.descriptor.dir()
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &ModuleDescriptor {
        self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &HostContext {
        &*self.host
    }

    #[inline]
    #[must_use]
    pub fn services(&self) -> &Arc<ServiceHub> {
        self.host.services()
    }

    #[inline]
    #[must_use]
    pub fn templates(&self) -> &TemplateEngine {
        self.host.templates()
    }

    /// Typed module config from the entry point's `config` section.
    ///
    /// Falls back to `T::default()` when the section is absent.
    ///
    /// # Errors
    /// Returns an error if the section is present but does not deserialize into `T`.
    pub fn config<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        let Some(raw) = self.config else {
            return Ok(T::default());
        };
        serde_json::from_value(raw.clone()).map_err(|e| {
            anyhow::anyhow!("invalid config for module '{}': {e}", self.module_name)
        })
    }

    // ---- registration surface ----

    /// Bind namespace `name` to `path`. Last write wins.
    pub fn register_namespace(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.host.register_namespace(name, path);
    }

    /// Add a route to the host router.
    ///
    /// # Errors
    /// Returns an error if `path` is invalid or overlaps a route another module
    /// (or this one) already registered.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> anyhow::Result<&mut Self> {
        self.host.route(path, method_router)?;
        tracing::debug!(module = %self.module_name, path, "route registered");
        Ok(self)
    }

    /// Merge a module-owned router into the host router.
    ///
    /// # Errors
    /// Returns an error if a merged route overlaps one already registered.
    pub fn merge(&mut self, router: Router) -> anyhow::Result<&mut Self> {
        self.host.merge(router)?;
        Ok(self)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Cfg {
        #[serde(default)]
        greeting: String,
        #[serde(default)]
        times: u32,
    }

    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor {
            path: PathBuf::from("/mods/greeter/autoload.yaml"),
            root: PathBuf::from("/mods"),
        }
    }

    #[test]
    fn config_defaults_when_absent() {
        let mut host = HostContext::default();
        let d = descriptor();
        let ctx = ModuleCtx::new(&mut host, "greeter", &d, None);
        assert_eq!(ctx.config::<Cfg>().unwrap(), Cfg::default());
        assert_eq!(ctx.module_dir(), Path::new("/mods/greeter"));
    }

    #[test]
    fn config_is_typed() {
        let mut host = HostContext::default();
        let d = descriptor();
        let raw = json!({"greeting": "Hi", "times": 2});
        let ctx = ModuleCtx::new(&mut host, "greeter", &d, Some(&raw));
        assert_eq!(
            ctx.config::<Cfg>().unwrap(),
            Cfg {
                greeting: "Hi".to_owned(),
                times: 2
            }
        );
    }

    #[test]
    fn invalid_config_names_the_module() {
        let mut host = HostContext::default();
        let d = descriptor();
        let raw = json!({"times": "many"});
        let ctx = ModuleCtx::new(&mut host, "greeter", &d, Some(&raw));
        let err = ctx.config::<Cfg>().unwrap_err();
        assert!(err.to_string().contains("greeter"));
    }

    async fn ok() -> &'static str {
        "ok"
    }

    #[test]
    fn overlapping_route_is_an_error_and_keeps_the_router() {
        let mut host = HostContext::default();
        host.route("/a", axum::routing::get(ok)).unwrap();

        let err = host.route("/a", axum::routing::get(ok)).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("cannot register route /a"), "{text}");
        assert!(text.contains("Overlapping method route"), "{text}");

        // Same path with another method is not a conflict.
        host.route("/a", axum::routing::post(ok)).unwrap();
    }

    #[test]
    fn overlapping_merge_is_an_error() {
        let mut host = HostContext::default();
        let d = descriptor();
        let mut ctx = ModuleCtx::new(&mut host, "greeter", &d, None);
        ctx.merge(Router::new().route("/g", axum::routing::get(ok)))
            .unwrap();
        assert!(
            ctx.merge(Router::new().route("/g", axum::routing::get(ok)))
                .is_err()
        );
    }

    #[test]
    fn namespaces_registered_through_module_ctx_reach_the_host() {
        let mut host = HostContext::default();
        let d = descriptor();
        {
            let ctx = ModuleCtx::new(&mut host, "greeter", &d, None);
            ctx.register_namespace("greeter", ctx.module_dir().join("templates"));
        }
        assert_eq!(
            host.namespaces().resolve("greeter"),
            Some(PathBuf::from("/mods/greeter/templates"))
        );
    }
}
