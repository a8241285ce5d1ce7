use anyhow::{Result, bail};
use clap::Args;
use std::time::Instant;

use crate::cli::Output;
use crate::config::ParallelConfig;
use crate::parallel::{get_num_threads, parallel_reduce};

#[derive(Args)]
pub struct BenchArgs {
    /// Sum the indices in [0, END)
    #[arg(long, default_value_t = 10_000_000)]
    pub end: i64,

    /// Minimum chunk size
    #[arg(long, default_value_t = 10_000)]
    pub grain: i64,

    /// Threads per call, overriding the configuration
    #[arg(long)]
    pub threads: Option<usize>,
}

pub fn execute(args: BenchArgs, mut config: ParallelConfig, output: &Output) -> Result<()> {
    if args.end < 0 {
        bail!("--end must be non-negative, got {}", args.end);
    }
    if let Some(threads) = args.threads {
        config.num_threads = threads;
    }
    config.apply()?;

    let expected = args.end as i128 * (args.end as i128 - 1) / 2;

    output.info(&format!(
        "Summing [0, {}) with grain size {}",
        args.end, args.grain
    ));
    let started = Instant::now();
    let sequential = sum_range(0, args.end, 0);
    let sequential_elapsed = started.elapsed();

    let started = Instant::now();
    let parallel = parallel_reduce(
        0,
        args.end,
        args.grain,
        0_i128,
        |s, e, acc| Ok(sum_range(s, e, acc)),
        |a, b| a + b,
    )?;
    let parallel_elapsed = started.elapsed();

    output.verbose(&format!("expected sum {expected}"));
    output.header("parallel_reduce benchmark");
    output.key_value("range:", &format!("[0, {})", args.end));
    output.key_value("grain size:", &args.grain.to_string());
    output.key_value("threads:", &get_num_threads().to_string());
    output.key_value("sequential:", &format!("{sequential_elapsed:?}"));
    output.key_value("parallel:", &format!("{parallel_elapsed:?}"));

    if parallel != expected || sequential != expected {
        output.error(&format!(
            "sum mismatch: parallel={parallel} sequential={sequential} expected={expected}"
        ));
        bail!("benchmark produced a wrong result");
    }
    output.success(&format!("sum = {parallel}"));
    Ok(())
}

fn sum_range(start: i64, end: i64, acc: i128) -> i128 {
    (start..end).fold(acc, |a, i| a + i as i128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_range() {
        assert_eq!(sum_range(0, 1_000_000, 0), 499_999_500_000);
        assert_eq!(sum_range(5, 5, 7), 7);
    }
}
