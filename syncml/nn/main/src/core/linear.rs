//! Linear layer implementation.

use std::time::Instant;

use crate::api::error::{NnError, NnResult};
use crate::api::traits::{param_name, Module};
use syncml_core::Tensor;

/// A fully connected linear layer: y = xW^T + b
#[derive(Debug, Clone)]
pub struct Linear {
    /// Weight matrix [out_features, in_features]
    pub weight: Tensor,
    /// Optional bias vector [out_features]
    pub bias: Option<Tensor>,
    /// Input features
    pub in_features: usize,
    /// Output features
    pub out_features: usize,
}

impl Linear {
    /// Create a new linear layer with random initialization (with bias).
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self::with_bias(in_features, out_features, true)
    }

    /// Create a linear layer without bias
    pub fn new_no_bias(in_features: usize, out_features: usize) -> Self {
        Self::with_bias(in_features, out_features, false)
    }

    /// Create a linear layer with or without bias.
    pub fn with_bias(in_features: usize, out_features: usize, use_bias: bool) -> Self {
        // Xavier/Glorot initialization
        let scale = (2.0 / (in_features + out_features) as f32).sqrt();
        let weight = Tensor::randn(vec![out_features, in_features]).mul_scalar(scale);
        let bias = if use_bias {
            Some(Tensor::zeros(vec![out_features]))
        } else {
            None
        };

        Self {
            weight,
            bias,
            in_features,
            out_features,
        }
    }

    /// Create a linear layer from existing weights
    pub fn from_weights(weight: Tensor, bias: Option<Tensor>) -> NnResult<Self> {
        let shape = weight.shape();
        if shape.len() != 2 {
            return Err(NnError::InvalidConfig("Weight must be 2D".into()));
        }
        let out_features = shape[0];
        let in_features = shape[1];

        if let Some(ref b) = bias {
            if b.shape() != [out_features] {
                return Err(NnError::ShapeMismatch(format!(
                    "Bias shape {:?} doesn't match out_features {}",
                    b.shape(),
                    out_features
                )));
            }
        }

        Ok(Self {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    /// Forward pass: y = xW^T + b
    ///
    /// Input shape: [..., in_features]
    /// Output shape: [..., out_features]
    pub fn forward(&self, x: &Tensor) -> NnResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };

        match x.shape().last() {
            Some(&k) if k == self.in_features => {}
            _ => {
                return Err(NnError::ShapeMismatch(format!(
                    "Linear expects [..., {}], got {:?}",
                    self.in_features,
                    x.shape()
                )))
            }
        }

        let output = x.matmul(&self.weight.t()?)?;
        let output = match self.bias {
            Some(ref b) => output.add(b)?,
            None => output,
        };

        if let Some(t) = _t {
            log::trace!("[perf] linear::forward {:?}->{:?} {:.3}ms",
                x.shape(), output.shape(), t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(output)
    }
}

impl Module for Linear {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        f(&param_name(prefix, "weight"), &self.weight);
        if let Some(ref b) = self.bias {
            f(&param_name(prefix, "bias"), b);
        }
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        f(&param_name(prefix, "weight"), &mut self.weight);
        if let Some(ref mut b) = self.bias {
            f(&param_name(prefix, "bias"), b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_forward_known_weights() {
        let w = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], vec![3, 2]).unwrap();
        let b = Tensor::from_vec(vec![0.5, -0.5, 0.0], vec![3]).unwrap();
        let linear = Linear::from_weights(w, Some(b)).unwrap();
        let x = Tensor::from_vec(vec![2.0, 3.0], vec![1, 2]).unwrap();
        let y = linear.forward(&x).unwrap();
        assert_eq!(y.shape(), &[1, 3]);
        assert_eq!(y.to_vec(), vec![2.5, 2.5, 5.0]);
    }

    #[test]
    fn test_linear_3d_input() {
        let linear = Linear::new(8, 5);
        let y = linear.forward(&Tensor::randn([2, 3, 8])).unwrap();
        assert_eq!(y.shape(), &[2, 3, 5]);
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let linear = Linear::new(8, 5);
        assert!(linear.forward(&Tensor::randn([2, 7])).is_err());
    }

    #[test]
    fn test_from_weights_bad_bias() {
        let w = Tensor::zeros(vec![3, 2]);
        assert!(Linear::from_weights(w, Some(Tensor::zeros(vec![2]))).is_err());
    }

    #[test]
    fn test_parameter_names() {
        let linear = Linear::new(4, 2);
        let mut names = Vec::new();
        linear.visit_parameters("mlp.0", &mut |n, _| names.push(n.to_string()));
        assert_eq!(names, vec!["mlp.0.weight", "mlp.0.bias"]);
        assert_eq!(Linear::new_no_bias(4, 2).parameter_count(), 8);
    }
}
