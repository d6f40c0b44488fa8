mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod ui;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::ui::{UiEvent, UiManager};
use clap::Parser;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run_app(cli).await {
        // Lets the progress display clear its last line before the error is printed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app(cli: Cli) -> Result<()> {
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    install_error_hooks()?;
    info!("HopKMC CLI v{} starting.", env!("CARGO_PKG_VERSION"));
    debug!("Parsed arguments: {:?}", cli);

    if let Some(threads) = cli.threads {
        configure_thread_pool(threads)?;
    }

    let (ui_manager, ui_sender, shutdown) = UiManager::new();
    let ui_task = tokio::spawn(ui_manager.run());

    let outcome = dispatch(cli.command, ui_sender).await;
    match &outcome {
        Ok(()) => println!("✅ Done."),
        Err(e) => error!("Command failed: {}", e),
    }

    if shutdown.send(true).is_err() {
        warn!("Progress display exited before shutdown.");
    }
    ui_task
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("Progress display task failed: {}", e)))?;

    outcome
}

async fn dispatch(command: Commands, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run::run(args, ui_sender).await,
        Commands::Msd(args) => commands::msd::run(args, ui_sender).await,
        Commands::Inspect(args) => commands::inspect::run(args).await,
    }
}

fn install_error_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |info| {
        error!("{}", panic_hook.panic_report(info));
    }));
    Ok(())
}

fn configure_thread_pool(threads: usize) -> Result<()> {
    info!("Running trajectories on {} threads.", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to build thread pool: {}", e)))
}
