mod commands;
mod target;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stackreap_config::Settings;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use target::TargetArgs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackreap")]
#[command(about = "Tear down every OpenStack resource of a cluster, found by its tags", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Settings file (defaults to STACKREAP_CONFIG, ./stackreap.yaml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every resource owned by the cluster
    Destroy {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Verify credentials and that the cloud supports tag-based teardown
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Version needs neither logging nor settings
    if matches!(cli.command, Commands::Version) {
        println!("stackreap {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing(cli.verbose, cli.log_file.as_deref())?;
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Destroy { target } => {
            commands::destroy::handle(&target, settings).await?;
        }
        Commands::Check { target } => {
            commands::check::handle(&target, settings).await?;
        }
        Commands::Version => {
            unreachable!("Version is handled before settings are loaded");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_env_filter(filter)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => stackreap_config::load_settings_from(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => stackreap_config::load_settings().context("cannot load settings")?,
    };
    Ok(settings)
}
