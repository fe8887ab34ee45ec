use greeter::GreeterApi;
use hostkit::{HostModule, ModuleCtx};
use serde::Deserialize;
use tracing::{debug, info};

use crate::rest::{StatusState, router};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Serve `GET /status/fail`.
    pub failure_route: bool,
    pub failure_message: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            failure_route: true,
            failure_message: "status \"fail\" endpoint triggered".to_owned(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Status;

impl HostModule for Status {
    fn register(&self, ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()> {
        let cfg: StatusConfig = ctx.config()?;

        let greeter = ctx.services().get::<dyn GreeterApi>().ok();
        if greeter.is_none() {
            debug!("greeter service not available; status reports without a greeting");
        }

        let modules_before = ctx
            .host()
            .activated_modules()
            .iter()
            .map(|m| m.name.clone())
            .collect();

        let state = StatusState {
            namespaces: ctx.host().namespaces().clone(),
            modules_before,
            greeter,
            failure_message: cfg.failure_message,
        };
        ctx.merge(router(state, cfg.failure_route))?;

        info!(failure_route = cfg.failure_route, "Status module registered");
        Ok(())
    }
}

hostkit::register_module!("status", Status);
