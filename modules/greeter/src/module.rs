use std::sync::Arc;

use hostkit::{HostModule, ModuleCtx};
use serde::Deserialize;
use tracing::info;

use crate::contract::GreeterApi;
use crate::domain::GreeterService;
use crate::rest::{GreeterState, router};

/// Template namespace owned by this module.
pub const NAMESPACE: &str = "greeter";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GreeterConfig {
    pub salutation: String,
    /// Namespaced template rendered by `GET /greeter/{name}`.
    pub template: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            salutation: "Hello".to_owned(),
            template: "@greeter/hello.html".to_owned(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Greeter;

impl HostModule for Greeter {
    fn register(&self, ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()> {
        let cfg: GreeterConfig = ctx.config()?;

        let templates_dir = ctx.module_dir().join("templates");
        ctx.register_namespace(NAMESPACE, &templates_dir);

        let service: Arc<dyn GreeterApi> = Arc::new(GreeterService::new(cfg.salutation));
        ctx.services().register::<dyn GreeterApi>(service.clone());

        let state = GreeterState {
            service,
            templates: ctx.templates().clone(),
            template: cfg.template,
        };
        ctx.merge(router(state))?;

        info!(templates = %templates_dir.display(), "Greeter module registered");
        Ok(())
    }
}

hostkit::register_module!("greeter", Greeter);
