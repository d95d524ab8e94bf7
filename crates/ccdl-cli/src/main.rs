//! ccdl - offline package downloader

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ccdl_cli::cmd;
use ccdl_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let run = async {
        match cli.command {
            Commands::Download(args) => cmd::download::download(args).await,
            Commands::Setup(args) => cmd::setup::setup(args).await,
            Commands::Suite(args) => cmd::suite::suite(args).await,
            Commands::Completions { shell } => {
                cmd::completions::completions(shell);
                Ok(())
            }
        }
    };

    tokio::select! {
        result = run => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nTerminated by user");
            std::process::exit(130);
        }
    }
}
