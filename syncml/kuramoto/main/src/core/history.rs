//! Recorded phase trajectories and their export formats.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::api::error::{KuramotoError, KuramotoResult};
use crate::core::network::order_parameter;
use crate::core::plot;

/// Phases of every oscillator at every recorded step, `[steps, N]` row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseHistory {
    data: Vec<f64>,
    num_oscillators: usize,
    dt: f64,
}

impl PhaseHistory {
    pub(crate) fn with_capacity(num_oscillators: usize, steps: usize, dt: f64) -> Self {
        Self {
            data: Vec::with_capacity(num_oscillators * steps),
            num_oscillators,
            dt,
        }
    }

    pub(crate) fn push(&mut self, phases: &[f64]) -> KuramotoResult<()> {
        if phases.len() != self.num_oscillators {
            return Err(KuramotoError::InvalidState(format!(
                "history row has {} phases, expected {}",
                phases.len(),
                self.num_oscillators
            )));
        }
        self.data.extend_from_slice(phases);
        Ok(())
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        if self.num_oscillators == 0 {
            0
        } else {
            self.data.len() / self.num_oscillators
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn num_oscillators(&self) -> usize {
        self.num_oscillators
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Phases at recorded step `t`.
    pub fn row(&self, t: usize) -> Option<&[f64]> {
        let n = self.num_oscillators;
        self.data.get(t * n..(t + 1) * n)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks(self.num_oscillators.max(1))
    }

    /// Trajectory of oscillator `i` over all recorded steps.
    pub fn series(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().filter_map(move |row| row.get(i).copied())
    }

    /// Order parameter magnitude `r` at each recorded step.
    pub fn order_parameters(&self) -> Vec<f64> {
        self.rows().map(|row| order_parameter(row).0).collect()
    }

    /// CSV with header `step,time,theta_1,...,theta_N`.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> KuramotoResult<()> {
        write!(writer, "step,time")?;
        for i in 1..=self.num_oscillators {
            write!(writer, ",theta_{}", i)?;
        }
        writeln!(writer)?;

        for (t, row) in self.rows().enumerate() {
            write!(writer, "{},{}", t, t as f64 * self.dt)?;
            for theta in row {
                write!(writer, ",{}", theta)?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// SVG line chart, one polyline per oscillator.
    pub fn write_svg<W: Write>(&self, writer: W, title: &str) -> KuramotoResult<()> {
        plot::write_phase_chart(self, writer, title)
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> KuramotoResult<()> {
        self.write_csv(BufWriter::new(File::create(path)?))
    }

    pub fn save_svg<P: AsRef<Path>>(&self, path: P, title: &str) -> KuramotoResult<()> {
        self.write_svg(BufWriter::new(File::create(path)?), title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> PhaseHistory {
        let mut h = PhaseHistory::with_capacity(2, 3, 0.5);
        h.push(&[0.0, 1.0]).unwrap();
        h.push(&[0.5, 1.5]).unwrap();
        h.push(&[1.0, 2.0]).unwrap();
        h
    }

    #[test]
    fn test_rows_and_series() {
        let mut h = history();
        assert_eq!(h.len(), 3);
        assert_eq!(h.row(1), Some(&[0.5, 1.5][..]));
        assert_eq!(h.row(3), None);
        assert_eq!(h.series(1).collect::<Vec<_>>(), vec![1.0, 1.5, 2.0]);
        assert!(h.push(&[1.0]).is_err());
    }

    #[test]
    fn test_csv_layout() {
        let mut buf = Vec::new();
        history().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,time,theta_1,theta_2");
        assert_eq!(lines[1], "0,0,0,1");
        assert_eq!(lines[2], "1,0.5,0.5,1.5");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_history() {
        let h = PhaseHistory::with_capacity(3, 0, 0.01);
        assert!(h.is_empty());
        assert_eq!(h.len(), 0);
        assert!(h.order_parameters().is_empty());
        let mut buf = Vec::new();
        h.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "step,time,theta_1,theta_2,theta_3\n");
    }
}
