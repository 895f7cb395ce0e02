use std::time::Instant;

use syncml_core::Tensor;
use syncml_nn::{param_name, FeedForward, LayerNorm, Module, MultiHeadAttention};

use crate::api::error::SudokuResult;
use crate::core::config::SudokuTransformerConfig;

/// Pre-norm block whose attention sub-layer is applied repeatedly.
///
/// `forward(src, T)` runs `src += attn(layernorm1(src))` T times with the
/// same weights, then `src += mlp(layernorm2(src))` once.
#[derive(Debug, Clone)]
pub struct TransformerBlock {
    pub layernorm1: LayerNorm,
    pub attn: MultiHeadAttention,
    pub layernorm2: LayerNorm,
    pub mlp: FeedForward,
}

impl TransformerBlock {
    /// Build a block for a `height x width` token grid. The grid only
    /// matters when `config.gta` is set.
    pub fn new(config: &SudokuTransformerConfig, height: usize, width: usize) -> SudokuResult<Self> {
        let mut attn = MultiHeadAttention::new(config.channels, config.heads)?;
        if config.gta {
            attn = attn.with_grid_rotary(height, width, config.rope_theta)?;
        }
        Ok(Self {
            layernorm1: LayerNorm::with_eps(config.channels, config.layer_norm_eps),
            attn,
            layernorm2: LayerNorm::with_eps(config.channels, config.layer_norm_eps),
            mlp: FeedForward::new(config.channels, config.mlp_dim, config.dropout)?,
        })
    }

    pub fn forward(&self, src: &Tensor, repeats: usize) -> SudokuResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };

        let mut src = src.clone();
        for _ in 0..repeats {
            let attended = self.attn.forward(&self.layernorm1.forward(&src)?)?;
            src = src.add(&attended)?;
        }
        let mixed = self.mlp.forward(&self.layernorm2.forward(&src)?)?;
        let src = src.add(&mixed)?;

        if let Some(t) = _t {
            log::trace!("[perf] block::forward {:?} T={} {:.3}ms",
                src.shape(), repeats, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(src)
    }
}

impl Module for TransformerBlock {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        self.layernorm1.visit_parameters(&param_name(prefix, "layernorm1"), f);
        self.attn.visit_parameters(&param_name(prefix, "attn"), f);
        self.layernorm2.visit_parameters(&param_name(prefix, "layernorm2"), f);
        self.mlp.visit_parameters(&param_name(prefix, "mlp"), f);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        self.layernorm1.visit_parameters_mut(&param_name(prefix, "layernorm1"), f);
        self.attn.visit_parameters_mut(&param_name(prefix, "attn"), f);
        self.layernorm2.visit_parameters_mut(&param_name(prefix, "layernorm2"), f);
        self.mlp.visit_parameters_mut(&param_name(prefix, "mlp"), f);
    }
}
