//! Status module.
//!
//! `GET /status` reports the live namespace bindings and, when the greeter
//! module was activated first, a greeting from its service. `GET /status/fail`
//! always fails, which makes it handy for checking error negotiation.

pub mod module;
mod rest;

pub use module::{Status, StatusConfig};
pub use rest::StatusReport;
