//! Non-causal multi-head self-attention with an optional grid rotary transform.

use std::time::Instant;

use crate::api::error::{NnError, NnResult};
use crate::api::traits::{param_name, Module};
use crate::core::grid_rotary::GridRotary;
use crate::core::linear::Linear;
use syncml_core::Tensor;

/// Multi-head self-attention over every token pair (no mask).
///
/// With a [`GridRotary`] attached, q, k and v are rotated by their grid
/// position before the scaled dot product and the per-head output is rotated
/// back before `o_proj`.
#[derive(Debug, Clone)]
pub struct MultiHeadAttention {
    num_heads: usize,
    head_dim: usize,
    d_model: usize,
    rotary: Option<GridRotary>,

    pub q_proj: Linear,
    pub k_proj: Linear,
    pub v_proj: Linear,
    pub o_proj: Linear,
}

impl MultiHeadAttention {
    /// Create a new attention layer with biased projections.
    pub fn new(d_model: usize, num_heads: usize) -> NnResult<Self> {
        let head_dim = Self::check_dims(d_model, num_heads)?;
        Ok(Self {
            num_heads,
            head_dim,
            d_model,
            rotary: None,
            q_proj: Linear::new(d_model, d_model),
            k_proj: Linear::new(d_model, d_model),
            v_proj: Linear::new(d_model, d_model),
            o_proj: Linear::new(d_model, d_model),
        })
    }

    /// Construct from pre-loaded projection layers.
    pub fn from_weights(
        num_heads: usize,
        q_proj: Linear,
        k_proj: Linear,
        v_proj: Linear,
        o_proj: Linear,
    ) -> NnResult<Self> {
        let d_model = q_proj.in_features;
        let head_dim = Self::check_dims(d_model, num_heads)?;
        for proj in [&q_proj, &k_proj, &v_proj, &o_proj] {
            if proj.in_features != d_model || proj.out_features != d_model {
                return Err(NnError::ShapeMismatch(format!(
                    "attention projections must be {}x{}, got {}x{}",
                    d_model, d_model, proj.out_features, proj.in_features
                )));
            }
        }
        Ok(Self { num_heads, head_dim, d_model, rotary: None, q_proj, k_proj, v_proj, o_proj })
    }

    /// Attach a grid rotary transform for an `height x width` token grid.
    pub fn with_grid_rotary(mut self, height: usize, width: usize, theta: f32) -> NnResult<Self> {
        self.rotary = Some(GridRotary::new(self.head_dim, height, width, theta)?);
        Ok(self)
    }

    fn check_dims(d_model: usize, num_heads: usize) -> NnResult<usize> {
        if num_heads == 0 || d_model % num_heads != 0 {
            return Err(NnError::InvalidConfig(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                d_model, num_heads
            )));
        }
        Ok(d_model / num_heads)
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    pub fn has_grid_rotary(&self) -> bool {
        self.rotary.is_some()
    }

    /// Input and output shape: [B, S, d_model].
    pub fn forward(&self, input: &Tensor) -> NnResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        let shape = input.shape();
        if shape.len() != 3 || shape[2] != self.d_model {
            return Err(NnError::ShapeMismatch(format!(
                "attention expects [B, S, {}], got {:?}",
                self.d_model, shape
            )));
        }
        let batch_size = shape[0];
        let seq_len = shape[1];

        // [B, S, H*D] -> [B, H, S, D]
        let split_heads = |t: Tensor| -> NnResult<Tensor> {
            Ok(t.reshape(&[batch_size, seq_len, self.num_heads, self.head_dim])?
                .transpose(1, 2)?)
        };
        let q = split_heads(self.q_proj.forward(input)?)?;
        let k = split_heads(self.k_proj.forward(input)?)?;
        let v = split_heads(self.v_proj.forward(input)?)?;

        let (q, k, v) = match self.rotary {
            Some(ref rot) => (rot.apply(&q)?, rot.apply(&k)?, rot.apply(&v)?),
            None => (q, k, v),
        };

        let scale = 1.0 / (self.head_dim as f32).sqrt();
        let scores = q.matmul(&k.transpose(2, 3)?)?.mul_scalar(scale);
        let attn = scores.softmax(-1)?;
        let context = attn.matmul(&v)?;

        let context = match self.rotary {
            Some(ref rot) => rot.apply_inverse(&context)?,
            None => context,
        };

        let context = context
            .transpose(1, 2)?
            .reshape(&[batch_size, seq_len, self.d_model])?;
        let output = self.o_proj.forward(&context)?;

        if let Some(t) = _t {
            log::trace!("[perf] attention::forward {:?} {:.3}ms",
                shape, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(output)
    }
}

impl Module for MultiHeadAttention {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        self.q_proj.visit_parameters(&param_name(prefix, "q_proj"), f);
        self.k_proj.visit_parameters(&param_name(prefix, "k_proj"), f);
        self.v_proj.visit_parameters(&param_name(prefix, "v_proj"), f);
        self.o_proj.visit_parameters(&param_name(prefix, "o_proj"), f);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        self.q_proj.visit_parameters_mut(&param_name(prefix, "q_proj"), f);
        self.k_proj.visit_parameters_mut(&param_name(prefix, "k_proj"), f);
        self.v_proj.visit_parameters_mut(&param_name(prefix, "v_proj"), f);
        self.o_proj.visit_parameters_mut(&param_name(prefix, "o_proj"), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attention_shape() {
        let attn = MultiHeadAttention::new(16, 4).unwrap();
        let y = attn.forward(&Tensor::randn([2, 9, 16])).unwrap();
        assert_eq!(y.shape(), &[2, 9, 16]);
        assert_eq!(attn.parameter_count(), 4 * (16 * 16 + 16));
    }

    #[test]
    fn test_attention_bad_heads() {
        assert!(MultiHeadAttention::new(10, 4).is_err());
        assert!(MultiHeadAttention::new(16, 0).is_err());
    }

    #[test]
    fn test_attention_with_grid_rotary() {
        let attn = MultiHeadAttention::new(16, 2)
            .unwrap()
            .with_grid_rotary(3, 3, 10000.0)
            .unwrap();
        assert!(attn.has_grid_rotary());
        let y = attn.forward(&Tensor::randn([1, 9, 16])).unwrap();
        assert_eq!(y.shape(), &[1, 9, 16]);
        // 9 tokens are required for a 3x3 grid.
        assert!(attn.forward(&Tensor::randn([1, 8, 16])).is_err());
    }

    #[test]
    fn test_uniform_tokens_give_uniform_output() {
        // Identical tokens attend uniformly and produce identical outputs.
        let attn = MultiHeadAttention::new(8, 2).unwrap();
        let token = Tensor::randn([1, 1, 8]);
        let x = Tensor::cat(&[&token, &token, &token], 1).unwrap();
        let y = attn.forward(&x).unwrap();
        let first = y.select(1, 0).unwrap().to_vec();
        for s in 1..3 {
            for (a, b) in y.select(1, s).unwrap().iter().zip(&first) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }
}
