//! Facade re-exports for syncml-nn

pub use crate::api::error::*;
pub use crate::api::traits::*;
pub use crate::core::attention::MultiHeadAttention;
pub use crate::core::dropout::Dropout;
pub use crate::core::embedding::Embedding;
pub use crate::core::feed_forward::FeedForward;
pub use crate::core::grid_rotary::GridRotary;
pub use crate::core::layer_norm::LayerNorm;
pub use crate::core::linear::Linear;
pub use crate::core::positional::positional_encoding_2d;
