//! f32 Tensor with shared storage and strided views.

use crate::api::error::{TensorError, TensorResult};
use crate::core::rng::with_rng;
use crate::core::shape::Shape;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Internal shape type: stack-allocated for ≤4 dims.
pub(crate) type TensorShape = SmallVec<[usize; 4]>;

/// A multi-dimensional f32 array.
///
/// Storage is reference-counted, so `clone()` and view operations
/// (reshape of contiguous data, transpose, permute, slice, select,
/// broadcast) never copy element data.
#[derive(Clone)]
pub struct Tensor {
    pub(crate) data: Arc<Vec<f32>>,
    pub(crate) offset: usize,
    pub(crate) shape_sv: TensorShape,
    pub(crate) strides: TensorShape,
}

impl Tensor {
    // ==================== Low-level constructors ====================

    /// Wrap an owned buffer whose length already matches `shape`.
    pub(crate) fn from_parts(data: Vec<f32>, shape: TensorShape) -> Self {
        let strides = Self::compute_strides_sv(&shape);
        Self {
            data: Arc::new(data),
            offset: 0,
            shape_sv: shape,
            strides,
        }
    }

    /// Create a view with new shape/strides over existing storage.
    pub(crate) fn view(
        data: Arc<Vec<f32>>,
        offset: usize,
        shape: TensorShape,
        strides: TensorShape,
    ) -> TensorResult<Self> {
        if shape.iter().all(|&d| d > 0) {
            let max_offset: usize = shape
                .iter()
                .zip(strides.iter())
                .map(|(&d, &s)| (d - 1) * s)
                .sum();
            if offset + max_offset >= data.len() {
                return Err(TensorError::IndexOutOfBounds {
                    dim: 0,
                    index: offset + max_offset,
                    size: data.len(),
                });
            }
        }
        Ok(Self {
            data,
            offset,
            shape_sv: shape,
            strides,
        })
    }

    // ==================== High-level constructors ====================

    /// Create a tensor from an f32 vector with the given shape.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> TensorResult<Self> {
        let shape = shape.into();
        if data.len() != shape.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self::from_parts(data, SmallVec::from_slice(shape.dims())))
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor filled with a specific value.
    pub fn full(shape: impl Into<Shape>, value: f32) -> Self {
        let shape = shape.into();
        Self::from_parts(vec![value; shape.numel()], SmallVec::from_slice(shape.dims()))
    }

    /// Create a tensor with values from the standard normal distribution.
    pub fn randn(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data: Vec<f32> = with_rng(|rng| {
            (0..shape.numel())
                .map(|_| {
                    let u1: f32 = rng.r#gen::<f32>().max(1e-7);
                    let u2: f32 = rng.r#gen();
                    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
                })
                .collect()
        });
        Self::from_parts(data, SmallVec::from_slice(shape.dims()))
    }

    /// Create a tensor with random uniform values in [0, 1).
    pub fn rand(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data: Vec<f32> = with_rng(|rng| (0..shape.numel()).map(|_| rng.r#gen()).collect());
        Self::from_parts(data, SmallVec::from_slice(shape.dims()))
    }

    /// Create a tensor with random uniform values in [low, high).
    pub fn uniform(shape: impl Into<Shape>, low: f32, high: f32) -> TensorResult<Self> {
        if !(low < high) {
            return Err(TensorError::InvalidOperation(format!(
                "uniform requires low < high, got [{}, {})",
                low, high
            )));
        }
        let shape = shape.into();
        let dist = Uniform::new(low, high);
        let data: Vec<f32> =
            with_rng(|rng| (0..shape.numel()).map(|_| dist.sample(rng)).collect());
        Ok(Self::from_parts(data, SmallVec::from_slice(shape.dims())))
    }

    // ==================== Properties ====================

    /// Get the shape as a slice.
    pub fn shape(&self) -> &[usize] {
        &self.shape_sv
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape_sv.len()
    }

    /// Get the total number of elements.
    pub fn numel(&self) -> usize {
        self.shape_sv.iter().product()
    }

    /// Check if tensor is laid out row-major without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.strides == Self::compute_strides_sv(&self.shape_sv)
    }

    /// Borrow the elements of a contiguous tensor.
    pub fn as_slice(&self) -> TensorResult<&[f32]> {
        if !self.is_contiguous() {
            return Err(TensorError::InvalidOperation(
                "as_slice requires a contiguous tensor; call contiguous() first".into(),
            ));
        }
        Ok(&self.data[self.offset..self.offset + self.numel()])
    }

    /// Copy the elements out in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        match self.as_slice() {
            Ok(slice) => slice.to_vec(),
            Err(_) => self.iter().collect(),
        }
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        TensorIterator::new(self)
    }

    /// Get a single element by indices.
    pub fn get(&self, indices: &[usize]) -> TensorResult<f32> {
        if indices.len() != self.ndim() {
            return Err(TensorError::InvalidOperation(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let mut offset = self.offset;
        for (i, &idx) in indices.iter().enumerate() {
            if idx >= self.shape_sv[i] {
                return Err(TensorError::IndexOutOfBounds {
                    dim: i,
                    index: idx,
                    size: self.shape_sv[i],
                });
            }
            offset += idx * self.strides[i];
        }
        Ok(self.data[offset])
    }

    // ==================== Internal helpers ====================

    pub(crate) fn compute_strides_sv(shape: &[usize]) -> TensorShape {
        if shape.is_empty() {
            return SmallVec::new();
        }
        let mut strides: TensorShape = smallvec::smallvec![1usize; shape.len()];
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    pub(crate) fn normalize_dim(&self, dim: i64) -> TensorResult<usize> {
        let ndim = self.ndim() as i64;
        let normalized = if dim < 0 { dim + ndim } else { dim };
        if normalized >= 0 && normalized < ndim {
            Ok(normalized as usize)
        } else {
            Err(TensorError::InvalidDimension {
                dim,
                ndim: self.ndim(),
            })
        }
    }

    /// Row-major copy of the data, borrowing when already contiguous.
    pub(crate) fn contiguous_data(&self) -> std::borrow::Cow<'_, [f32]> {
        match self.as_slice() {
            Ok(slice) => std::borrow::Cow::Borrowed(slice),
            Err(_) => std::borrow::Cow::Owned(self.iter().collect()),
        }
    }
}

// ==================== Tensor Iterator ====================

struct TensorIterator<'a> {
    tensor: &'a Tensor,
    indices: SmallVec<[usize; 4]>,
    offset: usize,
    remaining: usize,
}

impl<'a> TensorIterator<'a> {
    fn new(tensor: &'a Tensor) -> Self {
        Self {
            tensor,
            indices: smallvec::smallvec![0; tensor.ndim()],
            offset: tensor.offset,
            remaining: tensor.numel(),
        }
    }

    fn advance(&mut self) {
        let shape = &self.tensor.shape_sv;
        let strides = &self.tensor.strides;
        for i in (0..self.indices.len()).rev() {
            self.indices[i] += 1;
            self.offset += strides[i];
            if self.indices[i] < shape[i] {
                return;
            }
            self.offset -= strides[i] * shape[i];
            self.indices[i] = 0;
        }
    }
}

impl Iterator for TensorIterator<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let val = self.tensor.data[self.offset];
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(val)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// ==================== Display ====================

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?})", self.shape_sv.as_slice())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = Shape::new(self.shape_sv.to_vec());
        if self.numel() <= 100 {
            write!(f, "Tensor({}, {:?})", shape, self.to_vec())
        } else {
            let data = self.to_vec();
            let n = data.len();
            write!(
                f,
                "Tensor({}, [{:.4}, {:.4}, ..., {:.4}, {:.4}])",
                shape,
                data[0],
                data[1],
                data[n - 2],
                data[n - 1],
            )
        }
    }
}

// ==================== Tests ====================
