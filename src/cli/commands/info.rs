//! Info command implementation
//!
//! Reports pool sizes, hardware concurrency and the thread environment
//! variables without starting any pool.

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::cli::Output;
use crate::config::ParallelConfig;
use crate::info::parallel_info;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum InfoFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Default)]
pub struct InfoArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = InfoFormat::Text)]
    pub format: InfoFormat,
}

pub fn execute(args: InfoArgs, config: ParallelConfig, output: &Output) -> Result<()> {
    config.apply()?;
    let info = parallel_info();

    match args.format {
        InfoFormat::Json => output.raw(&serde_json::to_string_pretty(&info)?),
        InfoFormat::Text => {
            output.header("forkpool thread settings");
            output.key_value(
                "get_num_threads():",
                &format!("{} ({})", info.num_threads, info.intraop_state),
            );
            output.key_value(
                "get_num_interop_threads():",
                &info.num_interop_threads.to_string(),
            );
            output.key_value(
                "hardware concurrency:",
                &info.hardware_concurrency.to_string(),
            );
            output.key_value("physical cores:", &info.physical_cores.to_string());
            output.header("Environment variables");
            for (name, value) in &info.env {
                output.key_value(name, value);
            }
        }
    }

    Ok(())
}
