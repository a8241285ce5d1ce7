use anyhow::Result;
use clap::Parser;

use forkpool::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
