//! Facade re-exports for syncml-sudoku

pub use crate::api::error::*;
pub use crate::core::block::TransformerBlock;
pub use crate::core::board::SudokuBoard;
pub use crate::core::config::SudokuTransformerConfig;
pub use crate::core::encoding::{decode_boards, encode_batch, onehot_to_int};
pub use crate::core::metrics::SudokuMetrics;
pub use crate::core::model::SudokuTransformer;
