use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::api::error::{KuramotoError, KuramotoResult};
use crate::api::types::CouplingMode;

/// Parameters of a simulation run, loadable from JSON.
///
/// Missing fields take the defaults below: three oscillators, `dt = 0.01`,
/// 10000 steps, natural frequencies drawn from `[0.8, 1.2)` and couplings
/// from `[0.1, 0.5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KuramotoConfig {
    #[serde(default = "default_num_oscillators")]
    pub num_oscillators: usize,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_omega_range")]
    pub omega_range: [f64; 2],
    #[serde(default = "default_coupling_range")]
    pub coupling_range: [f64; 2],
    #[serde(default)]
    pub coupling_mode: CouplingMode,
    /// Seed for the initial state; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_oscillators() -> usize { 3 }
fn default_dt() -> f64 { 0.01 }
fn default_steps() -> usize { 10_000 }
fn default_omega_range() -> [f64; 2] { [0.8, 1.2] }
fn default_coupling_range() -> [f64; 2] { [0.1, 0.5] }

impl Default for KuramotoConfig {
    fn default() -> Self {
        Self {
            num_oscillators: default_num_oscillators(),
            dt: default_dt(),
            steps: default_steps(),
            omega_range: default_omega_range(),
            coupling_range: default_coupling_range(),
            coupling_mode: CouplingMode::default(),
            seed: None,
        }
    }
}

impl KuramotoConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> KuramotoResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: KuramotoConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KuramotoResult<()> {
        if self.num_oscillators == 0 {
            return Err(KuramotoError::InvalidConfig("num_oscillators must be > 0".into()));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(KuramotoError::InvalidConfig(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        check_range("omega_range", self.omega_range)?;
        check_range("coupling_range", self.coupling_range)?;
        Ok(())
    }
}

fn check_range(name: &str, [low, high]: [f64; 2]) -> KuramotoResult<()> {
    if !(low.is_finite() && high.is_finite() && (high - low).is_finite()) || low > high {
        return Err(KuramotoError::InvalidConfig(format!(
            "{} must be finite with low <= high and a finite width, got [{}, {}]",
            name, low, high
        )));
    }
    Ok(())
}
