//! dgascan command-line entry point.
//!
//! - `dgascan serve`: run the HTTP query server
//! - `dgascan check <DOMAIN>`: validate and classify one domain

use clap::{Parser, Subcommand};
use dgascan::detector::{DEFAULT_BIND_ADDR, DEFAULT_MODEL_DIR};
use dgascan::Detector;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

/// DGA domain detector
#[derive(Parser)]
#[command(name = "dgascan")]
#[command(version)]
#[command(about = "Classify domain names as benign or DGA-generated")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP query server
    Serve {
        /// Directory holding config.json and the model weights
        #[arg(long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = DEFAULT_BIND_ADDR)]
        bind: SocketAddr,

        /// Retry loading a missing model every N seconds
        #[arg(long)]
        retry_secs: Option<u64>,
    },
    /// Validate and classify a single domain
    Check {
        /// Domain to classify, e.g. example.com
        domain: String,

        /// Directory holding config.json and the model weights
        #[arg(long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            model_dir,
            bind,
            retry_secs,
        } => {
            let detector = Detector::builder()
                .model_dir(model_dir)
                .bind_addr(bind)
                .build()
                .await?;

            if let Some(secs) = retry_secs.filter(|_| !detector.is_model_loaded()) {
                detector.retry_load(Duration::from_secs(secs.max(1)));
            }

            dgascan::serve(detector).await
        }
        Commands::Check { domain, model_dir } => {
            let detector = Detector::builder()
                .model_dir(model_dir)
                .defer_load()
                .build()
                .await?;

            let result = detector.check_or_load(&domain).await?;
            println!(
                "{}: {} (confidence {})",
                result.domain,
                result.class,
                result.confidence_percent()
            );
            Ok(())
        }
    }
}
