//! Tensor math operations: matmul, broadcasting arithmetic, softmax, layer norm, reductions.

use super::tensor::{Tensor, TensorShape};
use crate::api::error::{TensorError, TensorResult};
use crate::core::runtime::{matmul_par_threshold, row_par_threshold};
use crate::core::shape::Shape;
use rayon::prelude::*;
use smallvec::{smallvec, SmallVec};

/// `out[M, N] = lhs[M, K] @ rhs[K, N]`, all row-major.
///
/// faer is column-major, so compute `C^T = B^T @ A^T`.
#[allow(non_snake_case)]
fn gemm_into(out: &mut [f32], lhs: &[f32], rhs: &[f32], M: usize, K: usize, N: usize) {
    let a_t = faer::mat::from_column_major_slice::<f32>(lhs, K, M);
    let b_t = faer::mat::from_column_major_slice::<f32>(rhs, N, K);
    let mut c_t = faer::mat::from_column_major_slice_mut::<f32>(out, N, M);
    c_t.copy_from(b_t * a_t);
}

#[allow(non_snake_case)]
impl Tensor {
    // ==================== Element-wise binary ops ====================

    fn binary_op<F>(&self, other: &Tensor, f: F) -> TensorResult<Tensor>
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.shape_sv == other.shape_sv {
            let data: Vec<f32> = match (self.as_slice(), other.as_slice()) {
                (Ok(a), Ok(b)) => a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect(),
                _ => self.iter().zip(other.iter()).map(|(x, y)| f(x, y)).collect(),
            };
            return Ok(Tensor::from_parts(data, self.shape_sv.clone()));
        }

        let out_shape = Shape::from(self.shape())
            .broadcast_with(&Shape::from(other.shape()))
            .ok_or_else(|| TensorError::BroadcastError {
                shape1: self.shape_sv.to_vec(),
                shape2: other.shape_sv.to_vec(),
            })?;
        let lhs = self.broadcast_to(&out_shape)?;
        let rhs = other.broadcast_to(&out_shape)?;
        let data: Vec<f32> = lhs.iter().zip(rhs.iter()).map(|(x, y)| f(x, y)).collect();
        Ok(Tensor::from_parts(data, SmallVec::from_slice(out_shape.dims())))
    }

    /// Element-wise addition with broadcasting.
    pub fn add(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a + b)
    }

    /// Element-wise subtraction with broadcasting.
    pub fn sub(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a - b)
    }

    /// Element-wise multiplication with broadcasting.
    pub fn mul(&self, other: &Tensor) -> TensorResult<Tensor> {
        self.binary_op(other, |a, b| a * b)
    }

    // ==================== Scalar ops ====================

    fn unary_op<F>(&self, f: F) -> Tensor
    where
        F: Fn(f32) -> f32,
    {
        let data: Vec<f32> = self.iter().map(f).collect();
        Tensor::from_parts(data, self.shape_sv.clone())
    }

    pub fn add_scalar(&self, scalar: f32) -> Tensor {
        self.unary_op(|x| x + scalar)
    }

    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        self.unary_op(|x| x * scalar)
    }

    pub fn div_scalar(&self, scalar: f32) -> Tensor {
        self.unary_op(|x| x / scalar)
    }

    pub fn sqrt(&self) -> Tensor {
        self.unary_op(|x| x.sqrt())
    }

    pub fn exp(&self) -> Tensor {
        self.unary_op(|x| x.exp())
    }

    pub fn cos(&self) -> Tensor {
        self.unary_op(|x| x.cos())
    }

    pub fn sin(&self) -> Tensor {
        self.unary_op(|x| x.sin())
    }

    pub fn tanh(&self) -> Tensor {
        self.unary_op(|x| x.tanh())
    }

    // ==================== Activations ====================

    /// GELU activation (tanh approximation).
    pub fn gelu(&self) -> Tensor {
        self.unary_op(|x| {
            let sqrt_2_over_pi = (2.0f32 / std::f32::consts::PI).sqrt();
            0.5 * x * (1.0 + (sqrt_2_over_pi * (x + 0.044715 * x.powi(3))).tanh())
        })
    }

    // ==================== Reductions ====================

    pub fn sum_all(&self) -> f32 {
        self.iter().sum()
    }

    pub fn mean_all(&self) -> f32 {
        self.sum_all() / self.numel() as f32
    }

    /// Split the shape around `dim_idx` into (outer, dim, inner) extents.
    fn split_dims(&self, dim_idx: usize) -> (usize, usize, usize) {
        let outer: usize = self.shape_sv[..dim_idx].iter().product();
        let inner: usize = self.shape_sv[dim_idx + 1..].iter().product();
        (outer, self.shape_sv[dim_idx], inner)
    }

    fn reduced_shape(&self, dim_idx: usize) -> TensorShape {
        let mut dims = self.shape_sv.clone();
        dims.remove(dim_idx);
        dims
    }

    /// Sum along a dimension (the dimension is removed).
    pub fn sum(&self, dim: i64) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        let (outer, size, inner) = self.split_dims(dim_idx);
        let data = self.contiguous_data();

        let mut out = vec![0.0f32; outer * inner];
        for o in 0..outer {
            for k in 0..size {
                let src = &data[(o * size + k) * inner..(o * size + k + 1) * inner];
                for (acc, &x) in out[o * inner..(o + 1) * inner].iter_mut().zip(src) {
                    *acc += x;
                }
            }
        }
        Ok(Tensor::from_parts(out, self.reduced_shape(dim_idx)))
    }

    /// Mean along a dimension.
    pub fn mean(&self, dim: i64) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        let dim_size = self.shape_sv[dim_idx] as f32;
        Ok(self.sum(dim)?.div_scalar(dim_size))
    }

    /// Max along a dimension. Returns (values, indices); ties resolve to the lowest index.
    pub fn max(&self, dim: i64) -> TensorResult<(Tensor, Tensor)> {
        let dim_idx = self.normalize_dim(dim)?;
        let (outer, size, inner) = self.split_dims(dim_idx);
        if size == 0 {
            return Err(TensorError::EmptyTensor);
        }
        let data = self.contiguous_data();

        let mut values = vec![f32::NEG_INFINITY; outer * inner];
        let mut indices = vec![0.0f32; outer * inner];
        for o in 0..outer {
            for i in 0..inner {
                let slot = o * inner + i;
                for k in 0..size {
                    let v = data[(o * size + k) * inner + i];
                    if k == 0 || v > values[slot] {
                        values[slot] = v;
                        indices[slot] = k as f32;
                    }
                }
            }
        }

        let shape = self.reduced_shape(dim_idx);
        Ok((
            Tensor::from_parts(values, shape.clone()),
            Tensor::from_parts(indices, shape),
        ))
    }

    /// Index of the maximum along a dimension, as f32.
    pub fn argmax(&self, dim: i64) -> TensorResult<Tensor> {
        let (_, indices) = self.max(dim)?;
        Ok(indices)
    }

    // ==================== Softmax ====================

    /// Softmax along a dimension. The last dimension uses a row-parallel kernel.
    pub fn softmax(&self, dim: i64) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        let ndim = self.ndim();

        if dim_idx != ndim - 1 {
            let last = ndim as i64 - 1;
            return self
                .transpose(dim_idx as i64, last)?
                .softmax(-1)?
                .transpose(dim_idx as i64, last)?
                .contiguous();
        }

        let input_data = self.contiguous_data();
        let last_dim_size = self.shape_sv[ndim - 1];
        let mut out_data = vec![0.0f32; input_data.len()];
        if last_dim_size == 0 {
            return Ok(Tensor::from_parts(out_data, self.shape_sv.clone()));
        }

        let softmax_row = |(out_row, in_row): (&mut [f32], &[f32])| {
            let max_val = in_row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            let mut sum_exp = 0.0;
            for (o, &val) in out_row.iter_mut().zip(in_row) {
                *o = (val - max_val).exp();
                sum_exp += *o;
            }
            for val in out_row.iter_mut() {
                *val /= sum_exp;
            }
        };

        if input_data.len() >= row_par_threshold() {
            out_data
                .par_chunks_mut(last_dim_size)
                .zip(input_data.par_chunks(last_dim_size))
                .for_each(softmax_row);
        } else {
            out_data
                .chunks_mut(last_dim_size)
                .zip(input_data.chunks(last_dim_size))
                .for_each(softmax_row);
        }

        Ok(Tensor::from_parts(out_data, self.shape_sv.clone()))
    }

    // ==================== Layer normalization ====================

    /// LayerNorm over the last dimension: `(x - mean) / sqrt(var + eps) * weight + bias`.
    pub fn layer_norm(&self, weight: &Tensor, bias: &Tensor, eps: f32) -> TensorResult<Tensor> {
        if self.shape_sv.is_empty() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![1],
                got: vec![],
            });
        }
        let last_dim = self.shape_sv[self.shape_sv.len() - 1];

        let input = self.contiguous_data();
        let gamma = weight.contiguous_data();
        let beta = bias.contiguous_data();

        if gamma.len() != last_dim || beta.len() != last_dim {
            return Err(TensorError::ShapeMismatch {
                expected: vec![last_dim],
                got: vec![gamma.len(), beta.len()],
            });
        }

        let mut out_data = vec![0.0f32; input.len()];
        if last_dim == 0 {
            return Ok(Tensor::from_parts(out_data, self.shape_sv.clone()));
        }

        let norm_row = |(out_row, row): (&mut [f32], &[f32])| {
            let mean = row.iter().sum::<f32>() / last_dim as f32;
            let var = row.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / last_dim as f32;
            let inv_std = 1.0 / (var + eps).sqrt();
            for j in 0..last_dim {
                out_row[j] = (row[j] - mean) * inv_std * gamma[j] + beta[j];
            }
        };

        if input.len() >= row_par_threshold() {
            out_data
                .par_chunks_mut(last_dim)
                .zip(input.par_chunks(last_dim))
                .for_each(norm_row);
        } else {
            out_data
                .chunks_mut(last_dim)
                .zip(input.chunks(last_dim))
                .for_each(norm_row);
        }

        Ok(Tensor::from_parts(out_data, self.shape_sv.clone()))
    }

    // ==================== Matrix multiplication ====================

    /// Matrix multiplication using faer for 2D, with broadcasting for higher dims.
    ///
    /// Supported forms: `[M, K] x [K, N]`, `[..., M, K] x [K, N]`, and
    /// `[..., M, K] x [..., K, N]` with identical batch dimensions.
    pub fn matmul(&self, other: &Tensor) -> TensorResult<Tensor> {
        let ndim = self.ndim();
        let other_ndim = other.ndim();

        if ndim > 2 && other_ndim == 2 {
            let K = self.shape_sv[ndim - 1];
            let M: usize = self.shape_sv[..ndim - 1].iter().product();
            let K2 = other.shape_sv[0];
            let N = other.shape_sv[1];

            if K != K2 {
                return Err(TensorError::MatmulDimensionMismatch { left: K, right: K2 });
            }

            let out_2d = self.reshape(&[M, K])?.matmul(other)?;
            let mut out_shape: TensorShape = SmallVec::from_slice(&self.shape_sv[..ndim - 1]);
            out_shape.push(N);
            return out_2d.reshape(&out_shape);
        }

        if ndim == other_ndim && ndim > 2 {
            return self.batched_matmul(other);
        }

        if ndim != 2 || other_ndim != 2 {
            return Err(TensorError::InvalidOperation(format!(
                "matmul requires 2D x 2D, ND x 2D or same-rank batched operands, got {:?} x {:?}",
                self.shape(),
                other.shape()
            )));
        }

        let M = self.shape_sv[0];
        let K = self.shape_sv[1];
        let K2 = other.shape_sv[0];
        let N = other.shape_sv[1];

        if K != K2 {
            return Err(TensorError::MatmulDimensionMismatch { left: K, right: K2 });
        }

        let lhs_data = self.contiguous_data();
        let rhs_data = other.contiguous_data();
        let mut out_data = vec![0.0f32; M * N];
        if M * N > 0 && K > 0 {
            gemm_into(&mut out_data, &lhs_data, &rhs_data, M, K, N);
        }

        Ok(Tensor::from_parts(out_data, smallvec![M, N]))
    }

    /// Batched matrix multiplication: `[B.., M, K] x [B.., K, N] -> [B.., M, N]`.
    pub fn batched_matmul(&self, other: &Tensor) -> TensorResult<Tensor> {
        let ndim = self.ndim();
        if ndim != other.ndim() || ndim < 3 {
            return Err(TensorError::InvalidOperation(
                "batched_matmul requires >=3D tensors of same ndim".into(),
            ));
        }

        let batch_dims = ndim - 2;
        if self.shape_sv[..batch_dims] != other.shape_sv[..batch_dims] {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape_sv.to_vec(),
                got: other.shape_sv.to_vec(),
            });
        }

        let batch_count: usize = self.shape_sv[..batch_dims].iter().product();
        let M = self.shape_sv[ndim - 2];
        let K = self.shape_sv[ndim - 1];
        let K2 = other.shape_sv[ndim - 2];
        let N = other.shape_sv[ndim - 1];

        if K != K2 {
            return Err(TensorError::MatmulDimensionMismatch { left: K, right: K2 });
        }

        let mut out_shape: TensorShape = SmallVec::from_slice(&self.shape_sv[..batch_dims]);
        out_shape.push(M);
        out_shape.push(N);

        let mut out_data = vec![0.0f32; batch_count * M * N];
        if M * N == 0 || K == 0 {
            return Ok(Tensor::from_parts(out_data, out_shape));
        }

        let lhs_data = self.contiguous_data();
        let rhs_data = other.contiguous_data();

        let kernel = |((out_chunk, lhs_chunk), rhs_chunk): ((&mut [f32], &[f32]), &[f32])| {
            gemm_into(out_chunk, lhs_chunk, rhs_chunk, M, K, N);
        };

        if out_data.len() >= matmul_par_threshold() {
            out_data
                .par_chunks_mut(M * N)
                .zip(lhs_data.par_chunks(M * K))
                .zip(rhs_data.par_chunks(K * N))
                .for_each(kernel);
        } else {
            out_data
                .chunks_mut(M * N)
                .zip(lhs_data.chunks(M * K))
                .zip(rhs_data.chunks(K * N))
                .for_each(kernel);
        }

        Ok(Tensor::from_parts(out_data, out_shape))
    }

    // ==================== Concatenation ====================

    /// Concatenate tensors along a dimension.
    pub fn cat(tensors: &[&Tensor], dim: i64) -> TensorResult<Tensor> {
        let first = tensors.first().ok_or(TensorError::EmptyTensor)?;
        let dim_idx = first.normalize_dim(dim)?;

        for t in tensors.iter().skip(1) {
            let compatible = t.ndim() == first.ndim()
                && first
                    .shape_sv
                    .iter()
                    .zip(t.shape_sv.iter())
                    .enumerate()
                    .all(|(i, (&s1, &s2))| i == dim_idx || s1 == s2);
            if !compatible {
                return Err(TensorError::ShapeMismatch {
                    expected: first.shape_sv.to_vec(),
                    got: t.shape_sv.to_vec(),
                });
            }
        }

        let outer: usize = first.shape_sv[..dim_idx].iter().product();
        let inner: usize = first.shape_sv[dim_idx + 1..].iter().product();
        let parts: Vec<_> = tensors.iter().map(|t| t.contiguous_data()).collect();

        let total_dim_size: usize = tensors.iter().map(|t| t.shape_sv[dim_idx]).sum();
        let mut new_dims = first.shape_sv.clone();
        new_dims[dim_idx] = total_dim_size;

        let mut new_data = Vec::with_capacity(outer * total_dim_size * inner);
        for o in 0..outer {
            for (t, data) in tensors.iter().zip(&parts) {
                let block = t.shape_sv[dim_idx] * inner;
                new_data.extend_from_slice(&data[o * block..(o + 1) * block]);
            }
        }

        Ok(Tensor::from_parts(new_data, new_dims))
    }
}
