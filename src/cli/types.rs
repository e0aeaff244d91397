//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "feedrunner")]
#[command(about = "Feedrunner - feed file submission and cleanup runner", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true, env = "FEEDRUNNER_CONFIG", default_value = "feedrunner.yaml")]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit every configured feed, wait for the results, archive and clean up
    Run,

    /// Validate the configuration and report problems a run would hit
    Check,
}
