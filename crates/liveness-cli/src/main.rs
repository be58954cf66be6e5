use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liveness_core::SessionConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod replay;
mod trace;

#[derive(Parser)]
#[command(name = "liveness", version, about = "Challenge-response liveness checks on landmark traces")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded trace through a liveness session.
    Replay {
        trace: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the challenge-order seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the features of every frame as JSON lines.
    Features {
        trace: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Load and validate a configuration file, then print the effective values.
    CheckConfig { file: PathBuf },
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    SessionConfig::load(path).context("failed to load configuration")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Replay {
            trace,
            config,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            replay::run(&trace, config)
        }
        Commands::Features { trace, config } => {
            let config = load_config(config.as_deref())?;
            replay::run_features(&trace, &config)
        }
        Commands::CheckConfig { file } => {
            let config = load_config(Some(&file))?;
            println!("{} ok", file.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
