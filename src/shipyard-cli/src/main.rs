mod cli;
mod commands;
mod config;
mod file_store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn init_tracing(verbose: bool) {
    let default = if verbose { "shipyard=debug" } else { "shipyard=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Import { input, save } => {
            commands::import::handle(input.as_deref(), save)?;
        }

        Commands::Decode { ship, code } => {
            commands::decode::handle(&ship, &code)?;
        }

        Commands::Roll(args) => {
            commands::roll::handle(&args)?;
        }

        Commands::Ships => {
            commands::ships::handle()?;
        }

        Commands::Configure {
            base_url,
            store,
            show,
        } => {
            commands::configure::handle(base_url, store, show)?;
        }
    }

    Ok(())
}
