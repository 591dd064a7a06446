mod cli;
mod commands;
mod config;
mod error;
mod listing;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::{Overrides, PartialConfig};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::setup("error reporting", e))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 strucmotif CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!("Setting Rayon global thread pool to {} threads.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| CliError::setup("thread pool", e))?;
    }

    let chunk_size = match &cli.command {
        Commands::Update(args) => args.chunk_size,
        Commands::Search(_) => None,
    };
    let overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        chunk_size,
    };
    let app_config = PartialConfig::load(cli.config.as_deref())?.merge(&overrides)?;
    debug!("Effective configuration: {:?}", &app_config);

    let command_result = match cli.command {
        Commands::Update(args) => {
            info!("Dispatching to 'update' command.");
            commands::update::run(args, app_config).await
        }
        Commands::Search(args) => {
            info!("Dispatching to 'search' command.");
            commands::search::run(args, app_config).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}
