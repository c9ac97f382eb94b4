// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vulkan_hwdec::Config;
use vulkan_hwdec::constants::logging;

mod cli;

#[derive(Parser)]
#[command(name = "vulkan-hwdec")]
#[command(about = "Inspect Vulkan hardware decode support")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/vulkan-hwdec/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the queue families each device would hand to the decoder
    Probe {
        /// Use the legacy fixed-role queue family fields
        #[arg(short, long)]
        legacy: bool,
    },

    /// List supported pixel formats and their plane layout
    Formats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref());

    // Initialize logging
    // RUST_LOG takes precedence over the configured filter
    // Examples: RUST_LOG=debug, RUST_LOG=vulkan_hwdec=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(logging::FILTER_ENV).unwrap_or_else(
                |_| {
                    tracing_subscriber::EnvFilter::try_new(&config.log_filter).unwrap_or_else(
                        |_| tracing_subscriber::EnvFilter::new(logging::DEFAULT_FILTER),
                    )
                },
            ),
        )
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Probe { legacy } => cli::probe_devices(&config, legacy),
        Commands::Formats => cli::list_formats(),
    }
}
