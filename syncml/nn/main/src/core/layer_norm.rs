use crate::api::error::{NnError, NnResult};
use crate::api::traits::{param_name, Module};
use syncml_core::Tensor;

/// Layer normalization over the last dimension with a learned affine transform.
#[derive(Debug, Clone)]
pub struct LayerNorm {
    pub weight: Tensor,
    pub bias: Tensor,
    pub eps: f32,
}

impl LayerNorm {
    /// Weight initialized to ones, bias to zeros, eps 1e-5.
    pub fn new(dim: usize) -> Self {
        Self::with_eps(dim, 1e-5)
    }

    pub fn with_eps(dim: usize, eps: f32) -> Self {
        Self {
            weight: Tensor::ones(vec![dim]),
            bias: Tensor::zeros(vec![dim]),
            eps,
        }
    }

    pub fn from_weights(weight: Tensor, bias: Tensor, eps: f32) -> NnResult<Self> {
        if weight.ndim() != 1 || weight.shape() != bias.shape() {
            return Err(NnError::ShapeMismatch(format!(
                "LayerNorm weight {:?} and bias {:?} must be equal 1D shapes",
                weight.shape(),
                bias.shape()
            )));
        }
        Ok(Self { weight, bias, eps })
    }

    pub fn dim(&self) -> usize {
        self.weight.numel()
    }

    pub fn forward(&self, x: &Tensor) -> NnResult<Tensor> {
        Ok(x.layer_norm(&self.weight, &self.bias, self.eps)?)
    }
}

impl Module for LayerNorm {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        f(&param_name(prefix, "weight"), &self.weight);
        f(&param_name(prefix, "bias"), &self.bias);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        f(&param_name(prefix, "weight"), &mut self.weight);
        f(&param_name(prefix, "bias"), &mut self.bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_norm_normalizes_rows() {
        let ln = LayerNorm::new(6);
        let x = Tensor::randn([3, 6]).mul_scalar(5.0).add_scalar(2.0);
        let y = ln.forward(&x).unwrap();
        for row in 0..3 {
            let r = y.select(0, row).unwrap();
            assert!(r.mean_all().abs() < 1e-4);
        }
        assert_eq!(ln.parameter_count(), 12);
    }

    #[test]
    fn test_layer_norm_width_mismatch() {
        let ln = LayerNorm::new(4);
        assert!(ln.forward(&Tensor::randn([2, 5])).is_err());
    }
}
