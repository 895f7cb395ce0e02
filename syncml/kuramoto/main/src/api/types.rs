use serde::{Deserialize, Serialize};

/// Sign convention of the coupling term.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingMode {
    /// `Kij · sin(θi − θj)`: positive couplings push phases apart.
    #[default]
    Repulsive,
    /// `Kij · sin(θj − θi)`: positive couplings pull phases together.
    Attractive,
}

impl CouplingMode {
    /// Coupling contribution of oscillator `j` (phase `theta_j`) on `i`.
    #[inline]
    pub fn term(self, theta_i: f64, theta_j: f64) -> f64 {
        match self {
            CouplingMode::Repulsive => (theta_i - theta_j).sin(),
            CouplingMode::Attractive => (theta_j - theta_i).sin(),
        }
    }
}
