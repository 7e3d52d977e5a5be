mod cli;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flash_queue::{core, web};
use std::path;

#[derive(Parser)]
#[command()]
struct Args {
    #[command(subcommand)]
    cmd: Commands,
    #[arg(short, long, default_value = "flash-queue.yaml")]
    /// Path to the YAML configuration file. If absolute path is provided it will be used as is.
    /// The relative path starting from "./" or "../" will be resolved using current working
    /// directory as a base path. The relative path that starts from something other than "./" or "../" will be resolved against the binary location.
    config: path::PathBuf,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Start the demo web server with flash notifications enabled
    Server,
    /// Render a single notification through the flash view and print the markup
    Preview {
        /// Notification type, e.g. "info" or "error"
        #[arg(short, long)]
        kind: Option<String>,
        /// The notification text
        message: String,
    },
}

fn real_main(args: Args) -> anyhow::Result<()> {
    let config =
        core::Config::load(args.config).with_context(|| "Failed to load configuration file")?;

    match args.cmd {
        Commands::Server => web::start_server(config).with_context(|| "Web server has failed"),
        Commands::Preview { kind, message } => cli::preview(config, kind, message)
            .with_context(|| "Failed to preview the notification"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Err(err) = real_main(args) {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
