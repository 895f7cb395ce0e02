//! GELU feed-forward network used in transformer blocks.

use crate::api::error::NnResult;
use crate::api::traits::{param_name, Module};
use crate::core::dropout::Dropout;
use crate::core::linear::Linear;
use syncml_core::Tensor;

/// Two-layer MLP: `dropout(down(gelu(up(x))))`.
///
/// Parameters are named by sequential position (`0` for the up projection,
/// `2` for the down projection) so the layout matches a
/// Linear / GELU / Linear / Dropout sequence.
#[derive(Debug, Clone)]
pub struct FeedForward {
    pub up_proj: Linear,
    pub down_proj: Linear,
    pub dropout: Dropout,
    pub hidden_dim: usize,
}

impl FeedForward {
    pub fn new(d_model: usize, hidden_dim: usize, dropout: f32) -> NnResult<Self> {
        Ok(Self {
            up_proj: Linear::new(d_model, hidden_dim),
            down_proj: Linear::new(hidden_dim, d_model),
            dropout: Dropout::new(dropout)?,
            hidden_dim,
        })
    }

    /// Construct from pre-loaded projection layers.
    pub fn from_weights(up_proj: Linear, down_proj: Linear, dropout: Dropout) -> Self {
        let hidden_dim = up_proj.out_features;
        Self { up_proj, down_proj, dropout, hidden_dim }
    }

    pub fn forward(&self, input: &Tensor) -> NnResult<Tensor> {
        let hidden = self.up_proj.forward(input)?.gelu();
        let out = self.down_proj.forward(&hidden)?;
        self.dropout.forward(&out)
    }
}

impl Module for FeedForward {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        self.up_proj.visit_parameters(&param_name(prefix, "0"), f);
        self.down_proj.visit_parameters(&param_name(prefix, "2"), f);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        self.up_proj.visit_parameters_mut(&param_name(prefix, "0"), f);
        self.down_proj.visit_parameters_mut(&param_name(prefix, "2"), f);
    }
}
