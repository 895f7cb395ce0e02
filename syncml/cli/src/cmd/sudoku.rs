use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use syncml_core::manual_seed;
use syncml_sudoku::{encode_batch, SudokuBoard, SudokuTransformer, SudokuTransformerConfig};

#[derive(Args)]
pub struct SudokuArgs {
    /// 81 cells in row-major order; `.` or `0` marks a blank.
    #[arg(long)]
    puzzle: String,

    /// JSON model config. Flags below override its fields.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load weights from a safetensors file.
    #[arg(long, value_name = "PATH")]
    weights: Option<PathBuf>,

    /// Save the model's weights after the run.
    #[arg(long, value_name = "PATH")]
    save_weights: Option<PathBuf>,

    /// Seed for weight initialization.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    channels: Option<usize>,

    #[arg(long)]
    blocks: Option<usize>,

    #[arg(long)]
    heads: Option<usize>,

    #[arg(long)]
    mlp_dim: Option<usize>,

    /// Attention repeats per block.
    #[arg(long)]
    repeats: Option<usize>,

    /// Use grid rotary attention instead of a positional embedding.
    #[arg(long)]
    gta: bool,
}

fn build_config(args: &SudokuArgs) -> Result<SudokuTransformerConfig> {
    let mut config = match &args.config {
        Some(path) => SudokuTransformerConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SudokuTransformerConfig::default(),
    };
    if let Some(v) = args.channels {
        config.channels = v;
    }
    if let Some(v) = args.blocks {
        config.blocks = v;
    }
    if let Some(v) = args.heads {
        config.heads = v;
    }
    if let Some(v) = args.mlp_dim {
        config.mlp_dim = v;
    }
    if let Some(v) = args.repeats {
        config.repeats = v;
    }
    if args.gta {
        config.gta = true;
    }
    config.validate().context("Invalid model parameters")?;
    Ok(config)
}

pub fn run(args: SudokuArgs) -> Result<()> {
    let puzzle: SudokuBoard = args.puzzle.parse().context("Failed to parse --puzzle")?;
    if !puzzle.is_valid() {
        bail!("Puzzle has conflicting givens");
    }
    let config = build_config(&args)?;
    if let Some(seed) = args.seed {
        manual_seed(seed);
    }

    let model = match &args.weights {
        Some(path) => SudokuTransformer::from_safetensors(config, path)
            .with_context(|| format!("Failed to load weights: {}", path.display()))?,
        None => {
            log::warn!("No --weights given; predictions come from random initialization");
            SudokuTransformer::new(config)?
        }
    };

    let (x, is_input) = encode_batch(std::slice::from_ref(&puzzle))?;
    let logits = model.forward(&x, &is_input)?;
    println!("logits shape: {:?}", logits.shape());

    let solved = model.solve(std::slice::from_ref(&puzzle))?;
    if let Some(board) = solved.first() {
        println!("{}", board);
        println!("solved: {}", board.is_solved());
    }

    if let Some(path) = &args.save_weights {
        model
            .save_safetensors(path)
            .with_context(|| format!("Failed to save weights: {}", path.display()))?;
        eprintln!("Saved weights to {}", path.display());
    }
    Ok(())
}
