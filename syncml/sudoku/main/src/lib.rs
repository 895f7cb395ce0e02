//! # SyncML Sudoku
//!
//! A transformer over the 81 cells of a Sudoku grid.
//!
//! Each cell becomes a token (its digit embedded, blanks as digit 0), a 2D
//! positional encoding or a grid rotary attention transform marks where the
//! token sits, and every block applies its self-attention `repeats` times
//! with shared weights before a single MLP. The head scores the nine digit
//! classes of every cell.
//!
//! ## Example
//!
//! ```rust
//! use syncml_sudoku::{encode_batch, SudokuBoard, SudokuTransformer, SudokuTransformerConfig};
//!
//! let config = SudokuTransformerConfig {
//!     channels: 16, blocks: 1, heads: 2, mlp_dim: 32, repeats: 2,
//!     ..Default::default()
//! };
//! let model = SudokuTransformer::new(config).unwrap();
//! let board: SudokuBoard = "0".repeat(81).parse().unwrap();
//! let (x, is_input) = encode_batch(&[board]).unwrap();
//! let logits = model.forward(&x, &is_input).unwrap();
//! assert_eq!(logits.shape(), &[1, 9, 9, 9]);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
