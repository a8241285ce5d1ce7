//! Command-line interface for forkpool
//!
//! Inspect the threading setup and run a quick reduction benchmark.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod commands;
mod output;

pub use output::Output;

use crate::config::ParallelConfig;

#[derive(Parser)]
#[command(
    name = "forkpool",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fork-join parallel_for / parallel_reduce on a shared worker pool",
    long_about = None
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file instead of forkpool.toml
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show thread settings and related environment variables
    Info(commands::info::InfoArgs),
    /// Time a parallel sum reduction against a sequential one
    Bench(commands::bench::BenchArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config = match &self.config {
            Some(path) => ParallelConfig::load_from(path)?,
            None => ParallelConfig::load()?,
        };

        match self.command {
            Some(Commands::Info(args)) => commands::info::execute(args, config, &output),
            Some(Commands::Bench(args)) => commands::bench::execute(args, config, &output),
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // A subscriber may already be installed when the CLI is driven from tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
