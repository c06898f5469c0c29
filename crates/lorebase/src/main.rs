// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lorebase - knowledge-base question answering over your own documents.
//!
//! This is the binary entry point for the Lorebase service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod ask;
mod serve;
mod user;

/// Lorebase - knowledge-base question answering over your own documents.
#[derive(Parser, Debug)]
#[command(name = "lorebase", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (default: XDG hierarchy + LOREBASE_* env vars).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
    /// Ask a question against a knowledge base from the command line.
    Ask(ask::AskArgs),
    /// Create a user and print their API token.
    UserAdd {
        /// Username, unique across the instance.
        username: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => lorebase_config::load_config_from_path(path),
        None => lorebase_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lorebase: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.server.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run(config),
        Commands::Ask(args) => ask::run(config, args),
        Commands::UserAdd { username } => user::add(config, &username),
    };

    if let Err(e) = result {
        eprintln!("lorebase: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
