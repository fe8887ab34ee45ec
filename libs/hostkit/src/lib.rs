//! `HostKit` - discovery and activation of self-registering modules.
//!
//! A host walks its configured module roots for entry point files
//! ([`discovery::ENTRY_POINT`]), activates each one exactly once against a single
//! [`HostContext`], and serves the routes the modules registered. Failures at
//! request time are rendered as HTML, or as a small JSON envelope for clients
//! that accept JSON.
//!
//! Module crates implement [`HostModule`] and link themselves in with
//! [`register_module!`].

pub mod activation;
pub mod api;
pub mod bootstrap;
pub mod client_hub;
pub mod config;
pub mod context;
pub mod contracts;
pub mod discovery;
pub mod logging;
pub mod manifest;
pub mod namespaces;
pub mod paths;
pub mod registry;
pub mod signals;
pub mod templates;

pub use activation::{Activation, ActivationError, ModuleActivator};
pub use api::{Failure, HostError};
pub use bootstrap::HostApp;
pub use client_hub::ServiceHub;
pub use config::AppConfig;
pub use context::{HostContext, HostOptions, ModuleCtx};
pub use contracts::HostModule;
pub use discovery::{ModuleDescriptor, ModuleDiscoverer};
pub use namespaces::NamespaceRegistry;
pub use paths::{PathSpec, normalize_paths};
pub use registry::{ModuleCatalog, ModuleRegistration};
pub use templates::{TemplateContext, TemplateEngine};

// Used by `register_module!`.
pub use inventory;
