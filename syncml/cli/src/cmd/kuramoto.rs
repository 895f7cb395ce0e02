use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use syncml_kuramoto::{CouplingMode, KuramotoConfig, KuramotoNetwork};

#[derive(Args)]
pub struct KuramotoArgs {
    /// JSON simulation config. Flags below override its fields.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of oscillators.
    #[arg(long)]
    oscillators: Option<usize>,

    /// Euler integration step.
    #[arg(long)]
    dt: Option<f64>,

    /// Number of integration steps.
    #[arg(long)]
    steps: Option<usize>,

    /// Seed for frequencies, couplings and initial phases.
    #[arg(long)]
    seed: Option<u64>,

    /// Pull phases together instead of pushing them apart.
    #[arg(long)]
    attractive: bool,

    /// Write the phase history as CSV.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write a phase-vs-step SVG chart.
    #[arg(long, value_name = "PATH")]
    plot: Option<PathBuf>,

    /// Chart title for --plot.
    #[arg(long, default_value = "Kuramoto Model Simulation")]
    title: String,
}

fn build_config(args: &KuramotoArgs) -> Result<KuramotoConfig> {
    let mut config = match &args.config {
        Some(path) => KuramotoConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => KuramotoConfig::default(),
    };
    if let Some(n) = args.oscillators {
        config.num_oscillators = n;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.attractive {
        config.coupling_mode = CouplingMode::Attractive;
    }
    config.validate().context("Invalid simulation parameters")?;
    Ok(config)
}

pub fn run(args: KuramotoArgs) -> Result<()> {
    let config = build_config(&args)?;
    let mut network = KuramotoNetwork::from_config(&config)?;
    let (r0, _) = network.order_parameter();

    let history = network.simulate(config.steps, config.dt)?;
    let (r, psi) = network.order_parameter();

    println!(
        "oscillators={} steps={} dt={} mode={:?}",
        config.num_oscillators, config.steps, config.dt, config.coupling_mode
    );
    println!("order parameter: r={:.4} -> r={:.4} (psi={:.4})", r0, r, psi);
    for (i, theta) in network.phases().iter().enumerate() {
        println!("  theta_{} = {:.6}", i + 1, theta);
    }

    if let Some(path) = &args.csv {
        history
            .save_csv(path)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
        eprintln!("Wrote {} rows to {}", history.len(), path.display());
    }
    if let Some(path) = &args.plot {
        history
            .save_svg(path, &args.title)
            .with_context(|| format!("Failed to write plot: {}", path.display()))?;
        eprintln!("Wrote plot to {}", path.display());
    }
    Ok(())
}
