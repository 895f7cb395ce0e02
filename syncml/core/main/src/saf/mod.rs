//! Facade re-exports for syncml-core

pub use crate::api::error::*;
pub use crate::core::rng::{manual_seed, with_rng};
pub use crate::core::runtime::RuntimeConfig;
pub use crate::core::shape::Shape;
pub use crate::core::tensor::Tensor;
