// onecycle - schedule preview and checkpoint inspection
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

use onecycle::config::{load_config, load_default_config, Config};
use onecycle::training::{latest_checkpoint, load_checkpoint};

#[derive(Parser, Debug)]
#[command(name = "onecycle")]
#[command(about = "Learning-rate schedules and training checkpoints", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Print the learning rate and momentum for every epoch
    Preview {
        /// Config file (default: ~/.onecycle/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of epochs from the config
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Show the newest checkpoint in a folder
    Latest {
        /// Checkpoint folder (default: save_folder from the config)
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Checkpoint file extension
        #[arg(long, default_value = "json")]
        ext: String,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Preview { config, epochs } => run_preview(config, epochs),
        Command::Latest { folder, ext } => run_latest(folder, &ext),
    }
}

fn init_tracing() {
    // Default: INFO level, can be overridden with RUST_LOG env var
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => load_config(&path),
        None => load_default_config()?.context(
            "No configuration found. Pass --config or create ~/.onecycle/config.toml",
        ),
    }
}

fn run_preview(config: Option<PathBuf>, epochs: Option<usize>) -> Result<()> {
    let mut config = resolve_config(config)?;
    if let Some(epochs) = epochs {
        config.schedule = config.schedule.with_epochs(epochs);
        config.validate()?;
    }

    let schedule = config.build_schedule();
    let has_momentum = schedule.has_momentum();

    println!("{:>6}  {:>14}  {:>10}", "epoch", "lr", "momentum");
    for (epoch, update) in schedule.into_updates().iter().enumerate() {
        let lr = update
            .lr
            .map_or_else(|| "-".to_string(), |lr| format!("{:.6e}", lr));
        let momentum = match (has_momentum, update.momentum) {
            (true, Some(momentum)) => format!("{:.4}", momentum),
            _ => "-".to_string(),
        };
        println!("{:>6}  {:>14}  {:>10}", epoch + 1, lr, momentum);
    }

    Ok(())
}

fn run_latest(folder: Option<PathBuf>, ext: &str) -> Result<()> {
    let folder = match folder {
        Some(folder) => folder,
        None => resolve_config(None)?.checkpoint.save_folder,
    };

    let Some(path) = latest_checkpoint(&folder, ext)? else {
        println!("No checkpoints in {}", folder.display());
        return Ok(());
    };

    let state = load_checkpoint(&path)?;
    println!("{}", path.display());
    println!("  epoch:     {}", state.epoch + 1);
    if let Some(batch) = state.batch {
        println!("  batch:     {}", batch + 1);
    }
    if let Some(avg_loss) = state.avg_loss {
        println!("  avg loss:  {:.4}", avg_loss);
    }
    if let Some(loss) = state.history.loss.last() {
        println!("  last epoch loss: {:.4}", loss);
    }
    println!("  saved at:  {}", state.timestamp.to_rfc3339());

    Ok(())
}
