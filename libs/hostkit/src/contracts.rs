use crate::context::ModuleCtx;

/// A self-registering host module.
///
/// Pure wiring; must be sync. Runs once per activated entry point, during
/// startup, before the server accepts requests. Modules activated earlier have
/// already registered their routes, namespaces and services.
pub trait HostModule: Send + Sync + 'static {
    /// Register routes, template namespaces and services against the host.
    ///
    /// # Errors
    /// Any error aborts host startup.
    fn register(&self, ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()>;
}
