use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::api::error::{SudokuError, SudokuResult};

/// Hyperparameters of [`crate::SudokuTransformer`], loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SudokuTransformerConfig {
    /// Token width.
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default = "default_blocks")]
    pub blocks: usize,
    #[serde(default = "default_heads")]
    pub heads: usize,
    #[serde(default = "default_mlp_dim")]
    pub mlp_dim: usize,
    /// Attention applications per block (weights shared).
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Grid rotary attention instead of a learned positional embedding.
    #[serde(default)]
    pub gta: bool,
    #[serde(default)]
    pub dropout: f32,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f32,
    #[serde(default = "default_rope_theta")]
    pub rope_theta: f32,
}

fn default_channels() -> usize { 64 }
fn default_blocks() -> usize { 6 }
fn default_heads() -> usize { 4 }
fn default_mlp_dim() -> usize { 1024 }
fn default_repeats() -> usize { 16 }
fn default_layer_norm_eps() -> f32 { 1e-5 }
fn default_rope_theta() -> f32 { 10000.0 }

impl Default for SudokuTransformerConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            blocks: default_blocks(),
            heads: default_heads(),
            mlp_dim: default_mlp_dim(),
            repeats: default_repeats(),
            gta: false,
            dropout: 0.0,
            layer_norm_eps: default_layer_norm_eps(),
            rope_theta: default_rope_theta(),
        }
    }
}

impl SudokuTransformerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> SudokuResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: SudokuTransformerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn head_dim(&self) -> usize {
        self.channels / self.heads.max(1)
    }

    pub fn validate(&self) -> SudokuResult<()> {
        if self.channels == 0 {
            return Err(SudokuError::InvalidConfig("channels must be > 0".into()));
        }
        if self.heads == 0 {
            return Err(SudokuError::InvalidConfig("heads must be > 0".into()));
        }
        if self.channels % self.heads != 0 {
            return Err(SudokuError::InvalidConfig(format!(
                "channels ({}) must be divisible by heads ({})",
                self.channels, self.heads
            )));
        }
        if self.mlp_dim == 0 {
            return Err(SudokuError::InvalidConfig("mlp_dim must be > 0".into()));
        }
        if self.gta {
            if self.head_dim() % 4 != 0 {
                return Err(SudokuError::InvalidConfig(format!(
                    "gta requires head_dim divisible by 4, got {}",
                    self.head_dim()
                )));
            }
        } else if self.channels % 4 != 0 {
            return Err(SudokuError::InvalidConfig(format!(
                "2D positional encoding requires channels divisible by 4, got {}",
                self.channels
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SudokuError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if !(self.layer_norm_eps.is_finite() && self.layer_norm_eps > 0.0) {
            return Err(SudokuError::InvalidConfig("layer_norm_eps must be finite and > 0".into()));
        }
        Ok(())
    }
}
