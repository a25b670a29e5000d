//! dcm - Docker Compose Manager
//!
//! This is the main CLI entry point for dcm.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dcm::backend::{ConsoleLogConsumer, DockerComposeBackend};
use dcm::compose::ComposeLoader;
use dcm::orchestrator::{FailurePolicy, UpFlags, UpOrchestrator};
use dcm::settings::{
    absolute_root, Confirm, RuntimeConfig, SettingsStore, TerminalConfirm, DEFAULT_CONFIG_NAME,
    DEFAULT_DOCKER_ADDR,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// dcm - Manage your Docker Compose files with ease
#[derive(Parser)]
#[command(name = "dcm")]
#[command(version)]
#[command(about = "Manage your Docker Compose files with ease", long_about = None)]
struct Cli {
    /// Config file (default is ./.dcm.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Docker daemon address
    #[arg(short = 'd', long, global = true, default_value = DEFAULT_DOCKER_ADDR)]
    docker_addr: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Spin up your compose files
    Configs {
        /// Action to run
        action: ConfigsAction,
        /// Services to act on; empty means all
        services: Vec<String>,
        #[command(flatten)]
        up: UpArgs,
    },

    /// Initialize a new project
    Init {
        /// Project name
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigsAction {
    /// Create and start every discovered project
    Up,
}

#[derive(Args)]
struct UpArgs {
    /// Directory to search for projects (default is the working directory)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Run containers in the background
    #[arg(long)]
    detach: bool,
    /// Create containers without starting them
    #[arg(long)]
    no_start: bool,
    /// Disable services other than the given ones and their dependencies
    #[arg(long)]
    only_selected: bool,
    /// Stop all containers if any container was stopped
    #[arg(long)]
    abort_on_container_exit: bool,
    /// Return the exit code of the selected service container
    #[arg(long)]
    exit_code_from: Option<String>,
    /// Scale SERVICE to NUM instances
    #[arg(long, value_name = "SERVICE=NUM")]
    scale: Vec<String>,
    /// Produce monochrome output
    #[arg(long)]
    no_color: bool,
    /// Don't print prefix in logs
    #[arg(long)]
    no_log_prefix: bool,
    /// Attach to log output of all services
    #[arg(long)]
    attach_dependencies: bool,
    /// Attach to service output
    #[arg(long)]
    attach: Vec<String>,
    /// Wait for services to be running and healthy
    #[arg(long)]
    wait: bool,
    /// Keep bringing up other projects after one fails
    #[arg(long)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir().context("Could not determine working directory")?;

    let mut config = RuntimeConfig::new(&cwd);
    config.verbose = cli.verbose;
    config.docker_addr = cli.docker_addr;
    if let Some(path) = cli.config {
        config.config_file = path;
    }

    let Some(command) = cli.command else {
        println!("Welcome to Docker Compose Manager!\nAdd the '-h' flag to see all available commands.");
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Configs {
            action: ConfigsAction::Up,
            services,
            up,
        } => {
            if let Some(root) = &up.root {
                config.root = absolute_root(&cwd, root);
            }

            let mut store = SettingsStore::new(&config.config_file)?;
            if store.load()? {
                tracing::debug!("Using config file {}", store.path().display());
            } else {
                tracing::warn!("No project file found.");
            }
            if let Some(name) = store.get("projectname") {
                tracing::info!("Managing project group {}", name);
            }

            let policy = if up.keep_going {
                FailurePolicy::KeepGoing
            } else {
                FailurePolicy::FailFast
            };
            let consumer = ConsoleLogConsumer::new(!up.no_color, !up.no_log_prefix);
            let flags = UpFlags {
                services,
                detach: up.detach,
                no_start: up.no_start,
                only_selected: up.only_selected,
                cascade_stop: up.abort_on_container_exit,
                exit_code_from: up.exit_code_from,
                scale: up.scale,
                attach_dependencies: up.attach_dependencies,
                attach: up.attach,
                wait: up.wait,
            };

            let backend = DockerComposeBackend::new(&config);
            let orchestrator = UpOrchestrator::new(config, flags, ComposeLoader, backend)
                .with_policy(policy)
                .with_log_consumer(Box::new(consumer));

            let report = orchestrator.run().await?;

            for failure in &report.failures {
                tracing::error!("{}: {}", failure.directory.display(), failure.error);
            }
            tracing::info!(
                "{} started, {} created, {} failed",
                report.started.len(),
                report.created.len(),
                report.failures.len()
            );

            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Init { name } => {
            let mut store = SettingsStore::new(&config.config_file)?;

            if store.exists() {
                let overwrite = TerminalConfirm
                    .confirm("You already have a config file. Do you want to overwrite it")?;
                if !overwrite {
                    println!("Aborting, no changes were made.");
                    return Ok(ExitCode::SUCCESS);
                }
                store.load()?;
            }

            println!(
                "Initializing a new project in '{}' called '{}'",
                store.path().display(),
                name
            );
            store.set("projectname", name);
            store
                .save()
                .with_context(|| format!("Could not write {}", DEFAULT_CONFIG_NAME))?;

            Ok(ExitCode::SUCCESS)
        }
    }
}
