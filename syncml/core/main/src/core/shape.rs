//! Tensor shape type with numpy-style broadcasting rules.

use std::fmt;

/// Dimensions of a tensor, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// Zero-dimensional shape (one element).
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Broadcast two shapes together, aligning trailing dimensions.
    /// Returns `None` when a pair of dimensions differs and neither is 1.
    pub fn broadcast_with(&self, other: &Shape) -> Option<Shape> {
        let ndim = self.ndim().max(other.ndim());
        let mut dims = vec![0usize; ndim];
        for i in 0..ndim {
            let a = dim_from_end(&self.0, ndim - 1 - i);
            let b = dim_from_end(&other.0, ndim - 1 - i);
            dims[i] = match (a, b) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                _ => return None,
            };
        }
        Some(Shape(dims))
    }
}

/// Size of the `rev`-th dimension counted from the end; missing leading dims are 1.
fn dim_from_end(dims: &[usize], rev: usize) -> usize {
    if rev < dims.len() {
        dims[dims.len() - 1 - rev]
    } else {
        1
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_trailing() {
        let a = Shape::from([2, 81, 64]);
        let b = Shape::from([81, 64]);
        assert_eq!(a.broadcast_with(&b), Some(Shape::from([2, 81, 64])));
    }

    #[test]
    fn test_broadcast_ones() {
        let a = Shape::from([4, 1]);
        let b = Shape::from([1, 3]);
        assert_eq!(a.broadcast_with(&b), Some(Shape::from([4, 3])));
    }

    #[test]
    fn test_broadcast_incompatible() {
        let a = Shape::from([2, 3]);
        let b = Shape::from([4]);
        assert_eq!(a.broadcast_with(&b), None);
    }

    #[test]
    fn test_scalar_numel() {
        assert_eq!(Shape::scalar().numel(), 1);
        assert_eq!(format!("{}", Shape::from([9, 9])), "[9, 9]");
    }
}
