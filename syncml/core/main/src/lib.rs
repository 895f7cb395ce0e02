//! # SyncML Core
//!
//! Core tensor operations for the SyncML workspace.
//!
//! This crate provides an f32 `Tensor` type with the operations needed by the
//! layer crate and the Sudoku transformer:
//!
//! - Zero-copy reshape, transpose, permute, slice and broadcast views
//! - Broadcasting element-wise arithmetic
//! - Matrix multiplication (2D, ND x 2D, batched) backed by faer
//! - Softmax, layer normalization, GELU
//! - A thread-local seedable random generator for reproducible initialization
//!
//! ## Example
//!
//! ```rust
//! use syncml_core::Tensor;
//!
//! let a = Tensor::randn([2, 3]);
//! let b = Tensor::randn([3, 4]);
//! let c = a.matmul(&b).unwrap();
//! assert_eq!(c.shape(), &[2, 4]);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
