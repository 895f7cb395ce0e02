//! Oscillator state and the explicit-Euler integrator.

use std::f64::consts::TAU;
use std::time::Instant;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::api::error::{KuramotoError, KuramotoResult};
use crate::api::types::CouplingMode;
use crate::core::config::KuramotoConfig;
use crate::core::history::PhaseHistory;

/// Oscillator count above which the derivative is computed row-parallel.
const PAR_THRESHOLD: usize = 256;

/// Wrap an angle into `[0, 2π)`.
///
/// `rem_euclid` can round up to exactly `2π` for tiny negative inputs; that
/// case maps to 0.
pub fn wrap_phase(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// A network of `N` phase oscillators with dense `N x N` coupling.
#[derive(Debug, Clone)]
pub struct KuramotoNetwork {
    phases: Vec<f64>,
    frequencies: Vec<f64>,
    /// Row-major: `coupling[i * n + j]` is the influence of `j` on `i`.
    coupling: Vec<f64>,
    mode: CouplingMode,
}

impl KuramotoNetwork {
    /// Draw a random network from `config`.
    ///
    /// Frequencies come first, then the full coupling matrix (diagonal
    /// included, it contributes `sin 0 = 0`), then phases in `[0, 2π)`.
    pub fn from_config(config: &KuramotoConfig) -> KuramotoResult<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let n = config.num_oscillators;

        let frequencies = sample(&mut rng, config.omega_range, n);
        let coupling = sample(&mut rng, config.coupling_range, n * n);
        let phases = sample(&mut rng, [0.0, TAU], n);

        log::debug!(
            "[kuramoto] network n={} mode={:?} seed={:?}",
            n,
            config.coupling_mode,
            config.seed
        );
        Self::from_parts(phases, frequencies, coupling, config.coupling_mode)
    }

    /// Build a network from explicit state. Phases are wrapped into `[0, 2π)`.
    pub fn from_parts(
        phases: Vec<f64>,
        frequencies: Vec<f64>,
        coupling: Vec<f64>,
        mode: CouplingMode,
    ) -> KuramotoResult<Self> {
        let n = phases.len();
        if n == 0 {
            return Err(KuramotoError::InvalidState("network needs at least one oscillator".into()));
        }
        if frequencies.len() != n || coupling.len() != n * n {
            return Err(KuramotoError::InvalidState(format!(
                "expected {} frequencies and {}x{} couplings, got {} and {}",
                n,
                n,
                n,
                frequencies.len(),
                coupling.len()
            )));
        }
        let all_finite = phases
            .iter()
            .chain(&frequencies)
            .chain(&coupling)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(KuramotoError::InvalidState("state contains non-finite values".into()));
        }

        Ok(Self {
            phases: phases.into_iter().map(wrap_phase).collect(),
            frequencies,
            coupling,
            mode,
        })
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn coupling(&self) -> &[f64] {
        &self.coupling
    }

    pub fn mode(&self) -> CouplingMode {
        self.mode
    }

    /// `dθi = ωi + Σj Kij · term(θi, θj)` for every oscillator.
    pub fn derivative(&self) -> Vec<f64> {
        let n = self.len();
        let row = |i: usize| -> f64 {
            let theta_i = self.phases[i];
            let k_row = &self.coupling[i * n..(i + 1) * n];
            let coupling: f64 = k_row
                .iter()
                .zip(&self.phases)
                .map(|(&k, &theta_j)| k * self.mode.term(theta_i, theta_j))
                .sum();
            self.frequencies[i] + coupling
        };

        if n >= PAR_THRESHOLD {
            (0..n).into_par_iter().map(row).collect()
        } else {
            (0..n).map(row).collect()
        }
    }

    /// One explicit-Euler step: `θ ← (θ + dt · dθ) mod 2π`.
    pub fn step(&mut self, dt: f64) -> KuramotoResult<()> {
        check_dt(dt)?;
        let dtheta = self.derivative();
        let next: Vec<f64> = self.phases.iter().zip(&dtheta).map(|(&t, &d)| t + dt * d).collect();
        if next.iter().any(|t| !t.is_finite()) {
            return Err(KuramotoError::InvalidState(format!(
                "step with dt={} produced a non-finite phase", dt)));
        }
        for (theta, t) in self.phases.iter_mut().zip(next) {
            *theta = wrap_phase(t);
        }
        Ok(())
    }

    /// Run `steps` steps, recording the phases *before* each one.
    ///
    /// Row `t` of the returned history is the state at time `t · dt`; the
    /// network is left at time `steps · dt`.
    pub fn simulate(&mut self, steps: usize, dt: f64) -> KuramotoResult<PhaseHistory> {
        check_dt(dt)?;
        let _t = if log::log_enabled!(log::Level::Debug) { Some(Instant::now()) } else { None };

        let mut history = PhaseHistory::with_capacity(self.len(), steps, dt);
        for _ in 0..steps {
            history.push(&self.phases)?;
            self.step(dt)?;
        }

        if let Some(t) = _t {
            log::debug!("[perf] kuramoto::simulate n={} steps={} {:.3}ms",
                self.len(), steps, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(history)
    }

    /// Kuramoto order parameter `r e^{iψ} = (1/N) Σ e^{iθj}`; returns `(r, ψ)`.
    pub fn order_parameter(&self) -> (f64, f64) {
        order_parameter(&self.phases)
    }
}

/// `(r, ψ)` for a set of phases, ψ wrapped into `[0, 2π)`.
pub(crate) fn order_parameter(phases: &[f64]) -> (f64, f64) {
    let n = phases.len() as f64;
    let (sin_sum, cos_sum) = phases
        .iter()
        .fold((0.0, 0.0), |(s, c), &theta| (s + theta.sin(), c + theta.cos()));
    let (mean_sin, mean_cos) = (sin_sum / n, cos_sum / n);
    let r = (mean_sin * mean_sin + mean_cos * mean_cos).sqrt();
    (r, wrap_phase(mean_sin.atan2(mean_cos)))
}

fn check_dt(dt: f64) -> KuramotoResult<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(KuramotoError::InvalidConfig(format!("dt must be finite and > 0, got {}", dt)))
    }
}

/// `count` draws from `[low, high)`; a degenerate range yields `low`.
fn sample<R: Rng>(rng: &mut R, [low, high]: [f64; 2], count: usize) -> Vec<f64> {
    if low >= high {
        return vec![low; count];
    }
    let dist = Uniform::new(low, high);
    (0..count).map(|_| dist.sample(rng)).collect()
}
