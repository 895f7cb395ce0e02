//! Embedding layer implementation

use std::time::Instant;

use crate::api::error::{NnError, NnResult};
use crate::api::traits::{param_name, Module};
use syncml_core::Tensor;

/// Embedding layer that maps integer indices to dense vectors
#[derive(Debug, Clone)]
pub struct Embedding {
    /// Embedding weight matrix [num_embeddings, embedding_dim]
    pub weight: Tensor,
    /// Number of embeddings (vocabulary size)
    pub num_embeddings: usize,
    /// Embedding dimension
    pub embedding_dim: usize,
}

impl Embedding {
    /// Create a new embedding layer with random initialization
    pub fn new(num_embeddings: usize, embedding_dim: usize) -> Self {
        // Standard normal initialization scaled by 0.02
        let weight = Tensor::randn(vec![num_embeddings, embedding_dim]).mul_scalar(0.02);

        Self {
            weight,
            num_embeddings,
            embedding_dim,
        }
    }

    /// Create an embedding layer from existing weights
    pub fn from_weights(weight: Tensor) -> NnResult<Self> {
        let shape = weight.shape();
        if shape.len() != 2 {
            return Err(NnError::InvalidConfig("Embedding weight must be 2D".into()));
        }

        Ok(Self {
            num_embeddings: shape[0],
            embedding_dim: shape[1],
            weight,
        })
    }

    /// Forward pass: lookup embeddings for input indices
    ///
    /// Input shape: [...] (tensor of integer-valued indices)
    /// Output shape: [..., embedding_dim]
    pub fn forward(&self, indices: &Tensor) -> NnResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };

        let table = self.weight.contiguous()?;
        let table = table.as_slice()?;
        let mut output_data = Vec::with_capacity(indices.numel() * self.embedding_dim);

        for idx_f32 in indices.iter() {
            if idx_f32 < 0.0 || idx_f32.fract() != 0.0 || idx_f32 as usize >= self.num_embeddings {
                return Err(NnError::InvalidConfig(format!(
                    "Index {} out of bounds for embedding with {} entries",
                    idx_f32, self.num_embeddings
                )));
            }
            let row = idx_f32 as usize * self.embedding_dim;
            output_data.extend_from_slice(&table[row..row + self.embedding_dim]);
        }

        let mut output_shape = indices.shape().to_vec();
        output_shape.push(self.embedding_dim);

        let result = Tensor::from_vec(output_data, output_shape)?;
        if let Some(t) = _t {
            log::trace!("[perf] embedding::forward {:?}->{:?} {:.3}ms",
                indices.shape(), result.shape(), t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(result)
    }
}

impl Module for Embedding {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        f(&param_name(prefix, "weight"), &self.weight);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        f(&param_name(prefix, "weight"), &mut self.weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_lookup() {
        let w = Tensor::from_vec(vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0], vec![3, 2]).unwrap();
        let emb = Embedding::from_weights(w).unwrap();
        let idx = Tensor::from_vec(vec![2.0, 0.0, 1.0, 2.0], vec![2, 2]).unwrap();
        let out = emb.forward(&idx).unwrap();
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_eq!(out.to_vec(), vec![2.0, 2.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_embedding_out_of_range() {
        let emb = Embedding::new(10, 4);
        let idx = Tensor::from_vec(vec![10.0], vec![1]).unwrap();
        assert!(emb.forward(&idx).is_err());
        let idx = Tensor::from_vec(vec![-1.0], vec![1]).unwrap();
        assert!(emb.forward(&idx).is_err());
    }
}
