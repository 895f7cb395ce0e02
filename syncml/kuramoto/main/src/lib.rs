//! # SyncML Kuramoto
//!
//! Explicit-Euler simulation of a network of coupled phase oscillators.
//!
//! Each oscillator `i` has a phase `θi` in `[0, 2π)`, a natural frequency
//! `ωi` and a row of couplings `Kij`. One step advances every phase by
//! `dt · (ωi + Σj Kij · sin(θi − θj))` and wraps it back into `[0, 2π)`.
//! The recorded [`PhaseHistory`] can be exported as CSV or rendered to an
//! SVG line chart.
//!
//! ## Example
//!
//! ```rust
//! use syncml_kuramoto::{KuramotoConfig, KuramotoNetwork};
//!
//! let config = KuramotoConfig { steps: 100, seed: Some(1), ..Default::default() };
//! let mut network = KuramotoNetwork::from_config(&config).unwrap();
//! let history = network.simulate(config.steps, config.dt).unwrap();
//! assert_eq!(history.len(), 100);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
