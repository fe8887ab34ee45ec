//! Host startup: discovery, activation and serving.

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::activation::ModuleActivator;
use crate::config::AppConfig;
use crate::context::{HostContext, HostOptions};
use crate::discovery::{ModuleDescriptor, ModuleDiscoverer};
use crate::registry::ModuleCatalog;

/// Descriptors the configured module roots resolve to, in activation order.
#[must_use]
pub fn discover_configured(config: &AppConfig) -> Vec<ModuleDescriptor> {
    let roots = config.modules.roots();
    if roots.is_empty() {
        return Vec::new();
    }
    ModuleDiscoverer::new().discover(&roots)
}

/// A host whose modules have all been activated.
#[derive(Debug)]
pub struct HostApp {
    host: HostContext,
    bind_addr: String,
}

impl HostApp {
    /// Build the host context, discover modules under the configured roots and
    /// activate them in order.
    ///
    /// # Errors
    /// Returns the first module activation failure; startup must not continue.
    pub fn bootstrap(config: &AppConfig, catalog: ModuleCatalog) -> anyhow::Result<Self> {
        let mut host = HostContext::new(HostOptions {
            debug: config.server.debug,
            autoescape: config.templates.autoescape,
        });

        if config.modules.path.is_none() {
            tracing::info!("No module roots configured; skipping module loading");
        } else {
            let descriptors = discover_configured(config);
            tracing::info!(
                found = descriptors.len(),
                catalog = ?catalog.names(),
                "Activating modules..."
            );
            let mut activator = ModuleActivator::new(catalog);
            let activated = activator
                .activate_all(&descriptors, &mut host)
                .context("module activation failed")?;
            tracing::info!(activated, "Modules activated");
        }

        Ok(Self {
            host,
            bind_addr: config.server.bind_addr.clone(),
        })
    }

    #[must_use]
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    #[must_use]
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    /// The finished router, with error handling installed.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.host.into_router()
    }

    /// Bind the configured address and serve until `cancel` fires.
    ///
    /// # Errors
    /// Returns an error if binding fails or the server stops abnormally.
    pub async fn serve(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.bind_addr))?;
        self.serve_with_listener(listener, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires.
    ///
    /// # Errors
    /// Returns an error if the server stops abnormally.
    pub async fn serve_with_listener(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        let router = self.into_router();
        tracing::info!(%addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .context("HTTP server failed")?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
