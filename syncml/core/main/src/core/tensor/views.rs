//! Shape operations: reshape, transpose, permute, contiguous, slice, select, broadcast.

use super::tensor::{Tensor, TensorShape};
use crate::api::error::{TensorError, TensorResult};
use crate::core::shape::Shape;
use smallvec::SmallVec;

impl Tensor {
    // ==================== Reshape ====================

    /// Reshape the tensor. Zero-copy if contiguous.
    pub fn reshape(&self, shape: &[usize]) -> TensorResult<Tensor> {
        let current_size = self.numel();
        let new_size: usize = shape.iter().product();

        if current_size != new_size {
            return Err(TensorError::ShapeMismatch {
                expected: vec![current_size],
                got: vec![new_size],
            });
        }

        let base = if self.is_contiguous() {
            self.clone()
        } else {
            self.contiguous()?
        };
        Self::view(
            base.data,
            base.offset,
            SmallVec::from_slice(shape),
            Self::compute_strides_sv(shape),
        )
    }

    // ==================== Transpose ====================

    /// Transpose two dimensions. Zero-copy via stride swapping.
    pub fn transpose(&self, dim0: i64, dim1: i64) -> TensorResult<Tensor> {
        let dim0_idx = self.normalize_dim(dim0)?;
        let dim1_idx = self.normalize_dim(dim1)?;

        let mut new_shape = self.shape_sv.clone();
        let mut new_strides = self.strides.clone();
        new_shape.swap(dim0_idx, dim1_idx);
        new_strides.swap(dim0_idx, dim1_idx);

        Self::view(self.data.clone(), self.offset, new_shape, new_strides)
    }

    /// Transpose last two dimensions.
    pub fn t(&self) -> TensorResult<Tensor> {
        if self.ndim() < 2 {
            return Err(TensorError::InvalidOperation(
                "Cannot transpose tensor with less than 2 dimensions".into(),
            ));
        }
        self.transpose(-2, -1)
    }

    // ==================== Permute ====================

    /// Permute dimensions. Zero-copy via stride reordering.
    pub fn permute(&self, dims: &[usize]) -> TensorResult<Tensor> {
        if dims.len() != self.ndim() {
            return Err(TensorError::InvalidOperation(format!(
                "Permutation must have {} dimensions, got {}",
                self.ndim(),
                dims.len()
            )));
        }
        let mut seen = vec![false; dims.len()];
        let mut new_shape = TensorShape::with_capacity(dims.len());
        let mut new_strides = TensorShape::with_capacity(dims.len());

        for &d in dims {
            if d >= self.ndim() || seen[d] {
                return Err(TensorError::InvalidOperation(format!(
                    "Invalid permutation {:?} for {} dimensions",
                    dims,
                    self.ndim()
                )));
            }
            seen[d] = true;
            new_shape.push(self.shape_sv[d]);
            new_strides.push(self.strides[d]);
        }

        Self::view(self.data.clone(), self.offset, new_shape, new_strides)
    }

    // ==================== Contiguous ====================

    /// Make tensor contiguous (copy if necessary).
    pub fn contiguous(&self) -> TensorResult<Tensor> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        let data: Vec<f32> = self.iter().collect();
        Ok(Tensor::from_parts(data, self.shape_sv.clone()))
    }

    // ==================== Unsqueeze / Squeeze ====================

    /// Add a dimension of size 1 at the specified position.
    pub fn unsqueeze(&self, dim: i64) -> TensorResult<Tensor> {
        let ndim = self.ndim() as i64 + 1;
        let normalized = if dim < 0 { dim + ndim } else { dim };
        if normalized < 0 || normalized > self.ndim() as i64 {
            return Err(TensorError::InvalidDimension {
                dim,
                ndim: self.ndim(),
            });
        }
        let mut new_dims = self.shape_sv.to_vec();
        new_dims.insert(normalized as usize, 1);
        self.reshape(&new_dims)
    }

    /// Remove a dimension of size 1.
    pub fn squeeze(&self, dim: i64) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        if self.shape_sv[dim_idx] != 1 {
            return Err(TensorError::InvalidOperation(format!(
                "Cannot squeeze dimension {} with size {}",
                dim, self.shape_sv[dim_idx]
            )));
        }
        let mut new_dims = self.shape_sv.to_vec();
        new_dims.remove(dim_idx);
        self.reshape(&new_dims)
    }

    // ==================== Select / Slice ====================

    /// Select a single index along a dimension (reduces dimensionality).
    pub fn select(&self, dim: i64, index: usize) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        let dim_size = self.shape_sv[dim_idx];
        if index >= dim_size {
            return Err(TensorError::IndexOutOfBounds {
                dim: dim_idx,
                index,
                size: dim_size,
            });
        }

        let offset = self.offset + index * self.strides[dim_idx];
        let mut new_shape = self.shape_sv.clone();
        let mut new_strides = self.strides.clone();
        new_shape.remove(dim_idx);
        new_strides.remove(dim_idx);

        Self::view(self.data.clone(), offset, new_shape, new_strides)
    }

    /// Slice `[start, end)` along a dimension. Zero-copy.
    pub fn slice(&self, dim: i64, start: usize, end: usize) -> TensorResult<Tensor> {
        let dim_idx = self.normalize_dim(dim)?;
        let dim_size = self.shape_sv[dim_idx];
        if start > end || end > dim_size {
            return Err(TensorError::IndexOutOfBounds {
                dim: dim_idx,
                index: end,
                size: dim_size,
            });
        }

        let offset = self.offset + start * self.strides[dim_idx];
        let mut new_shape = self.shape_sv.clone();
        new_shape[dim_idx] = end - start;

        Self::view(self.data.clone(), offset, new_shape, self.strides.clone())
    }

    // ==================== Broadcast ====================

    /// Expand to `shape` following broadcasting rules. Zero-copy (stride 0).
    pub fn broadcast_to(&self, shape: &Shape) -> TensorResult<Tensor> {
        let target = shape.dims();
        let err = || TensorError::BroadcastError {
            shape1: self.shape_sv.to_vec(),
            shape2: target.to_vec(),
        };
        if target.len() < self.ndim() {
            return Err(err());
        }

        let lead = target.len() - self.ndim();
        let mut new_strides = TensorShape::with_capacity(target.len());
        for (i, &t) in target.iter().enumerate() {
            if i < lead {
                new_strides.push(0);
                continue;
            }
            let own = self.shape_sv[i - lead];
            if own == t {
                new_strides.push(self.strides[i - lead]);
            } else if own == 1 {
                new_strides.push(0);
            } else {
                return Err(err());
            }
        }

        Ok(Tensor {
            data: self.data.clone(),
            offset: self.offset,
            shape_sv: SmallVec::from_slice(target),
            strides: new_strides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn test_reshape_roundtrip_shape() {
        let t = Tensor::from_vec(arange(24), vec![2, 3, 4]).unwrap();
        let r = t.reshape(&[6, 4]).unwrap();
        assert_eq!(r.shape(), &[6, 4]);
        assert_eq!(r.to_vec(), arange(24));
        assert!(t.reshape(&[5, 5]).is_err());
    }

    #[test]
    fn test_reshape_non_contiguous_copies() {
        let t = Tensor::from_vec(arange(6), vec![2, 3]).unwrap();
        let r = t.t().unwrap().reshape(&[6]).unwrap();
        assert_eq!(r.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_permute() {
        let t = Tensor::from_vec(arange(24), vec![2, 3, 4]).unwrap();
        let p = t.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.get(&[1, 1, 2]).unwrap(), t.get(&[1, 2, 1]).unwrap());
        assert!(t.permute(&[0, 0, 1]).is_err());
    }

    #[test]
    fn test_select_and_slice() {
        let t = Tensor::from_vec(arange(12), vec![3, 4]).unwrap();
        let row = t.select(0, 1).unwrap();
        assert_eq!(row.to_vec(), vec![4.0, 5.0, 6.0, 7.0]);
        let col = t.select(1, 2).unwrap();
        assert_eq!(col.to_vec(), vec![2.0, 6.0, 10.0]);
        let s = t.slice(-1, 1, 3).unwrap();
        assert_eq!(s.shape(), &[3, 2]);
        assert_eq!(s.to_vec(), vec![1.0, 2.0, 5.0, 6.0, 9.0, 10.0]);
        assert!(t.slice(0, 2, 4).is_err());
    }

    #[test]
    fn test_unsqueeze_squeeze() {
        let t = Tensor::from_vec(arange(6), vec![2, 3]).unwrap();
        let u = t.unsqueeze(0).unwrap();
        assert_eq!(u.shape(), &[1, 2, 3]);
        assert_eq!(u.squeeze(0).unwrap().shape(), &[2, 3]);
        assert!(t.squeeze(0).is_err());
    }

    #[test]
    fn test_broadcast_to() {
        let t = Tensor::from_vec(vec![1.0, 2.0], vec![2, 1]).unwrap();
        let b = t.broadcast_to(&Shape::from([3, 2, 2])).unwrap();
        assert_eq!(b.shape(), &[3, 2, 2]);
        assert_eq!(b.to_vec(), vec![1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0]);
        assert!(t.broadcast_to(&Shape::from([3, 3])).is_err());
    }
}
