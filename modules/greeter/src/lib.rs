//! Greeter module.
//!
//! Binds the `greeter` template namespace to its own `templates/` directory,
//! serves `GET /greeter/{name}` and exposes [`GreeterApi`] to modules
//! activated after it.

pub mod contract;
mod domain;
pub mod module;
mod rest;

pub use contract::GreeterApi;
pub use module::{Greeter, GreeterConfig};
