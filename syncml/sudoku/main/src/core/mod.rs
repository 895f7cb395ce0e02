pub mod block;
pub mod board;
pub mod config;
pub mod encoding;
pub mod metrics;
pub mod model;
mod weights;
