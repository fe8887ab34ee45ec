//! Tracing subscriber setup for host binaries.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `cfg.level`. Output goes to stderr.
///
/// # Errors
/// Returns an error if the filter directive is invalid or a global subscriber
/// is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = build_filter(cfg, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// A set but unparsable `RUST_LOG` is an error, not a silent fallback to `cfg.level`.
fn build_filter(cfg: &LoggingConfig, env_directives: Option<String>) -> anyhow::Result<EnvFilter> {
    match env_directives.filter(|d| !d.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives).map_err(|e| {
            anyhow::anyhow!("invalid {} '{directives}': {e}", EnvFilter::DEFAULT_ENV)
        }),
        None => EnvFilter::try_new(&cfg.level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{}': {e}", cfg.level)),
    }
}
