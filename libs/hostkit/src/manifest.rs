//! Entry point manifest.
//!
//! The entry point file names the statically linked module implementation the
//! directory activates, plus an optional module-private configuration section:
//!
//! ```yaml
//! module: greeter
//! config:
//!   salutation: Hello
//! ```

use figment::Figment;
use figment::providers::{Format, Yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    /// Catalog name of the module implementation.
    pub module: String,
    /// Module-private configuration, handed to the module untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl ModuleManifest {
    /// Parse the manifest at `path`.
    ///
    /// # Errors
    /// Returns a figment error if the file is missing, is not valid YAML, or
    /// does not match the manifest shape.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Yaml::file_exact(path)).extract()
    }

    /// Parse a manifest from an in-memory YAML string.
    ///
    /// # Errors
    /// Returns a figment error if the string does not match the manifest shape.
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        Figment::from(Yaml::string(yaml)).extract()
    }
}
