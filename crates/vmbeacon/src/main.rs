//! vmbeacon - advertise and discover VM service debug sessions over mDNS.
//!
//! This is the main entry point for the vmbeacon CLI.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vmbeacon_discover::DiscoveryConfig;
use vmbeacon_util::log::{self, LogConfig, LogLevel};

#[derive(Parser)]
#[command(name = "vmbeacon")]
#[command(author, version, about = "Advertise and discover VM service debug sessions over mDNS", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to a file instead of stderr (default location when no
    /// path is given)
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advertise a debug session until interrupted
    Advertise(commands::advertise::AdvertiseArgs),
    /// List debug sessions advertised on the local network
    Browse {
        /// Seconds to wait for responses
        #[arg(short, long, default_value = "3")]
        timeout: u64,
        /// Print sessions as JSON
        #[arg(long)]
        json: bool,
        /// Stop at the first session found
        #[arg(long)]
        first: bool,
    },
    /// Parse an observation record from a file (or stdin) and print it as JSON
    Parse {
        /// File containing `key=value` lines; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DiscoveryConfig::load(cli.config.as_deref()).await?;
    init_logging(cli.verbose, cli.log_file, &config);

    match cli.command {
        Commands::Advertise(args) => commands::advertise::run(args, &config).await,
        Commands::Browse {
            timeout,
            json,
            first,
        } => commands::browse::run(timeout, json, first).await,
        Commands::Parse { file } => commands::parse::run(file.as_deref()),
    }
}

/// Logs go to stderr (or a file) so command output on stdout stays
/// machine-readable.
fn init_logging(verbose: bool, log_file: Option<Option<PathBuf>>, config: &DiscoveryConfig) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        config
            .log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Warn)
    };
    log::init(LogConfig {
        print: true,
        level,
        include_location: verbose,
        file: log_file.and_then(|path| path.or_else(log::default_log_path)),
    });
}
