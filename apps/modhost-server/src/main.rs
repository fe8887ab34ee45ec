mod registered_modules;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hostkit::bootstrap::discover_configured;
use hostkit::manifest::ModuleManifest;
use hostkit::signals::cancel_on_shutdown_signal;
use hostkit::{AppConfig, HostApp, ModuleCatalog};
use tokio_util::sync::CancellationToken;

/// ModHost Server - serves self-registering modules discovered on disk
#[derive(Parser)]
#[command(name = "modhost-server")]
#[command(about = "ModHost Server - serves self-registering modules discovered on disk")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and module activation, then exit
    Check,
    /// List discovered modules in activation order
    Modules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (MODHOST__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    hostkit::logging::init_logging(&config.logging)?;

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config).await,
        Commands::Check => check(&config),
        Commands::Modules => list_modules(&config),
    }
}

fn catalog() -> Result<ModuleCatalog> {
    ModuleCatalog::from_inventory().context("failed to collect linked modules")
}

async fn run_server(config: &AppConfig) -> Result<()> {
    tracing::info!("ModHost Server starting");

    let app = HostApp::bootstrap(config, catalog()?)?;

    let cancel = CancellationToken::new();
    let signals = cancel_on_shutdown_signal(cancel.clone());

    let result = app.serve(cancel).await;
    signals.abort();
    result
}

fn check(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let app = HostApp::bootstrap(config, catalog()?)?;

    println!("Configuration is valid");
    println!(
        "{} module(s) activated",
        app.host().activated_modules().len()
    );
    Ok(())
}

fn list_modules(config: &AppConfig) -> Result<()> {
    let descriptors = discover_configured(config);
    if descriptors.is_empty() {
        println!("No modules found");
        return Ok(());
    }

    for descriptor in descriptors {
        let module = ModuleManifest::load(&descriptor.path).map_or_else(
            |e| format!("<invalid manifest: {e}>"),
            |manifest| manifest.module,
        );
        println!("{module}\t{}", descriptor.dir().display());
    }
    Ok(())
}
