//! Feedrunner CLI entry point.

use clap::Parser;

use feedrunner::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => feedrunner::cli::commands::run::execute(&cli.config, cli.json).await,
        Commands::Check => feedrunner::cli::commands::check::execute(&cli.config, cli.json).await,
    };

    if let Err(err) = result {
        feedrunner::cli::handle_error(err, cli.json);
    }
}
