//! # SyncML Neural Network
//!
//! Neural network layers built on `syncml-core` tensors.
//!
//! This crate provides the building blocks of the Sudoku transformer:
//! - Linear and embedding layers
//! - Layer normalization and dropout
//! - GELU feed-forward network
//! - Non-causal multi-head self-attention, optionally with a 2D grid rotary transform
//! - Sinusoidal 2D positional encoding
//!
//! ## Example
//!
//! ```rust
//! use syncml_core::Tensor;
//! use syncml_nn::{Linear, Module};
//!
//! let linear = Linear::new(8, 4);
//! let out = linear.forward(&Tensor::randn([2, 8])).unwrap();
//! assert_eq!(out.shape(), &[2, 4]);
//! assert_eq!(linear.parameter_count(), 8 * 4 + 4);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
