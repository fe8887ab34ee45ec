//! Layered host configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. a YAML file (optional)
//! 3. environment variables `MODHOST__<SECTION>__<KEY>`
//! 4. CLI overrides ([`AppConfig::apply_cli_overrides`])
//!
//! Module-private settings do not live here; they travel in each module's
//! entry point manifest.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::PathSpec;

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "MODHOST__";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub modules: ModulesConfig,
    pub templates: TemplatesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Expose panic messages in error responses.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Module root(s). Absent means no module loading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathSpec>,
}

impl ModulesConfig {
    /// Configured roots in order; empty when none are configured.
    #[must_use]
    pub fn roots(&self) -> Vec<PathBuf> {
        self.path.clone().map(PathSpec::normalize).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub autoescape: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { autoescape: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `hostkit=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (if given), then the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::FileNotFound`] if `path` is given but is not a file,
    /// or [`ConfigError::Invalid`] if the merged configuration does not deserialize.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file_exact(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Parse a YAML document on top of the defaults. Environment is not consulted.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the document does not deserialize.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Apply command-line overrides.
    ///
    /// `port` replaces the port of `server.bind_addr`; `verbose` raises the log
    /// level (`-v` info, `-vv` debug, `-vvv` trace).
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            let host = self
                .server
                .bind_addr
                .rsplit_once(':')
                .map_or(self.server.bind_addr.as_str(), |(host, _)| host);
            self.server.bind_addr = format!("{host}:{port}");
        }

        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// Pretty JSON rendering of the effective configuration.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_skip_module_loading() {
        let cfg = AppConfig::default();
        assert!(cfg.modules.path.is_none());
        assert!(cfg.modules.roots().is_empty());
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8087");
        assert!(cfg.templates.autoescape);
    }

    #[test]
    fn module_path_accepts_scalar_or_list() {
        let one = AppConfig::from_yaml("modules:\n  path: mods\n").unwrap();
        assert_eq!(one.modules.roots(), vec![PathBuf::from("mods")]);

        let many = AppConfig::from_yaml("modules:\n  path:\n    - b\n    - a\n").unwrap();
        assert_eq!(many.modules.roots(), vec![PathBuf::from("b"), PathBuf::from("a")]);
    }

    #[test]
    fn log_format_parses_lowercase() {
        let cfg = AppConfig::from_yaml("logging:\n  format: json\n").unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = AppConfig::load_or_default(Some(&tmp.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("host.yaml");
        fs::write(&file, "server:\n  bind_addr: 0.0.0.0:9000\n  debug: false\n").unwrap();

        temp_env::with_var("MODHOST__SERVER__DEBUG", Some("true"), || {
            let cfg = AppConfig::load_or_default(Some(&file)).unwrap();
            assert_eq!(cfg.server.bind_addr, "0.0.0.0:9000");
            assert!(cfg.server.debug);
        });
    }

    #[test]
    fn cli_overrides_port_and_verbosity() {
        let mut cfg = AppConfig::default();
        cfg.apply_cli_overrides(Some(9999), 2);
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9999");
        assert_eq!(cfg.logging.level, "debug");

        cfg.apply_cli_overrides(None, 0);
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:9999");
        assert_eq!(cfg.logging.level, "debug");
    }
}
