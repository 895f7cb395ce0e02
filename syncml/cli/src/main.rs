mod cmd;

use anyhow::{Context, Result};
use clap::Parser;
use syncml_core::RuntimeConfig;

/// SyncML: coupled-oscillator simulation and Sudoku transformer.
#[derive(Parser)]
#[command(name = "syncml", version, about)]
struct Cli {
    /// Worker threads for tensor kernels (0 = all cores).
    #[arg(long, global = true, default_value_t = 0)]
    threads: usize,

    #[command(subcommand)]
    command: cmd::Command,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    RuntimeConfig { num_threads: cli.threads, ..Default::default() }
        .apply()
        .context("Failed to configure runtime")?;
    cmd::run(cli.command)
}
