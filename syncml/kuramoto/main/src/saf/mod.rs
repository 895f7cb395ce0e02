//! Facade re-exports for syncml-kuramoto

pub use crate::api::error::*;
pub use crate::api::types::*;
pub use crate::core::config::KuramotoConfig;
pub use crate::core::history::PhaseHistory;
pub use crate::core::network::{wrap_phase, KuramotoNetwork};
