//! 2D rotary transform over a token grid.
//!
//! Each head vector is split in two halves. The first half is rotated by
//! angles proportional to the token's row, the second half by angles
//! proportional to its column, each with the rotate-half pairing
//! `(x[i], x[i + quarter])`. Rotating q and k makes attention scores depend
//! only on the relative grid offset between tokens; rotating v and applying
//! the inverse rotation to the attention output makes the aggregated values
//! relative as well.

use std::time::Instant;

use crate::api::error::{NnError, NnResult};
use syncml_core::Tensor;

/// Precomputed cos/sin tables for a `height x width` token grid.
#[derive(Debug, Clone)]
pub struct GridRotary {
    cos_table: Vec<f32>, // [height * width, head_dim / 2]
    sin_table: Vec<f32>, // [height * width, head_dim / 2]
    head_dim: usize,
    height: usize,
    width: usize,
}

impl GridRotary {
    /// Build tables for tokens laid out row-major (`token = row * width + col`).
    pub fn new(head_dim: usize, height: usize, width: usize, theta: f32) -> NnResult<Self> {
        if head_dim == 0 || head_dim % 4 != 0 {
            return Err(NnError::InvalidConfig(format!(
                "grid rotary requires head_dim divisible by 4, got {}",
                head_dim
            )));
        }
        if !(theta.is_finite() && theta > 1.0) {
            return Err(NnError::InvalidConfig(format!(
                "grid rotary theta must be finite and > 1, got {}",
                theta
            )));
        }

        let quarter = head_dim / 4;
        let freqs: Vec<f32> = (0..quarter)
            .map(|i| 1.0 / theta.powf(i as f32 / quarter as f32))
            .collect();

        let tokens = height * width;
        let mut cos_table = Vec::with_capacity(tokens * 2 * quarter);
        let mut sin_table = Vec::with_capacity(tokens * 2 * quarter);
        for row in 0..height {
            for col in 0..width {
                // Row angles fill the first quarter-block, column angles the second.
                for pos in [row, col] {
                    for &freq in &freqs {
                        let angle = pos as f32 * freq;
                        cos_table.push(angle.cos());
                        sin_table.push(angle.sin());
                    }
                }
            }
        }

        Ok(Self { cos_table, sin_table, head_dim, height, width })
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    pub fn num_tokens(&self) -> usize {
        self.height * self.width
    }

    /// Rotate `x` of shape `[B, H, S, D]` forward, `S = height * width`.
    pub fn apply(&self, x: &Tensor) -> NnResult<Tensor> {
        self.rotate(x, 1.0)
    }

    /// Undo [`GridRotary::apply`].
    pub fn apply_inverse(&self, x: &Tensor) -> NnResult<Tensor> {
        self.rotate(x, -1.0)
    }

    fn rotate(&self, x: &Tensor, sign: f32) -> NnResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Trace) { Some(Instant::now()) } else { None };
        let shape = x.shape();
        if shape.len() != 4 || shape[2] != self.num_tokens() || shape[3] != self.head_dim {
            return Err(NnError::ShapeMismatch(format!(
                "grid rotary expects [B, H, {}, {}], got {:?}",
                self.num_tokens(),
                self.head_dim,
                shape
            )));
        }

        let x = x.contiguous()?;
        let data = x.as_slice()?;
        let mut out = vec![0.0f32; data.len()];

        let half = self.head_dim / 2;
        let quarter = self.head_dim / 4;
        let seq_len = self.num_tokens();

        for (vec_idx, (src, dst)) in data
            .chunks(self.head_dim)
            .zip(out.chunks_mut(self.head_dim))
            .enumerate()
        {
            let table = (vec_idx % seq_len) * half;
            let cos = &self.cos_table[table..table + half];
            let sin = &self.sin_table[table..table + half];

            for block in 0..2 {
                let base = block * half;
                for i in 0..quarter {
                    let c = cos[block * quarter + i];
                    let s = sign * sin[block * quarter + i];
                    let x1 = src[base + i];
                    let x2 = src[base + quarter + i];
                    dst[base + i] = x1 * c - x2 * s;
                    dst[base + quarter + i] = x1 * s + x2 * c;
                }
            }
        }

        let result = Tensor::from_vec(out, shape.to_vec())?;
        if let Some(t) = _t {
            log::trace!("[perf] grid_rotary::rotate {:?} {:.3}ms",
                shape, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_rejects_bad_head_dim() {
        assert!(GridRotary::new(6, 3, 3, 10000.0).is_err());
        assert!(GridRotary::new(8, 3, 3, 10000.0).is_ok());
    }

    #[test]
    fn test_inverse_restores_input() {
        let rot = GridRotary::new(8, 3, 3, 10000.0).unwrap();
        let x = Tensor::randn([2, 2, 9, 8]);
        let back = rot.apply_inverse(&rot.apply(&x).unwrap()).unwrap();
        for (a, b) in back.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_origin_token_unchanged() {
        let rot = GridRotary::new(4, 2, 2, 100.0).unwrap();
        let x = Tensor::randn([1, 1, 4, 4]);
        let y = rot.apply(&x).unwrap();
        assert_eq!(
            y.select(2, 0).unwrap().to_vec(),
            x.select(2, 0).unwrap().to_vec()
        );
    }

    #[test]
    fn test_scores_depend_on_relative_offset() {
        // Same q/k content at two token pairs with equal grid offsets.
        let rot = GridRotary::new(8, 3, 3, 100.0).unwrap();
        let q: Vec<f32> = (0..8).map(|i| (i as f32 * 0.37).sin()).collect();
        let k: Vec<f32> = (0..8).map(|i| (i as f32 * 0.91).cos()).collect();
        let mut data = Vec::new();
        for _ in 0..9 {
            data.extend_from_slice(&q);
        }
        let qs = rot.apply(&Tensor::from_vec(data.clone(), vec![1, 1, 9, 8]).unwrap()).unwrap();
        let mut kdata = Vec::new();
        for _ in 0..9 {
            kdata.extend_from_slice(&k);
        }
        let ks = rot.apply(&Tensor::from_vec(kdata, vec![1, 1, 9, 8]).unwrap()).unwrap();
        let qs = qs.to_vec();
        let ks = ks.to_vec();
        let vec_at = |v: &[f32], tok: usize| v[tok * 8..tok * 8 + 8].to_vec();

        // (0,0)->(1,1) and (1,1)->(2,2) share offset (1,1).
        let s1 = dot(&vec_at(&qs, 0), &vec_at(&ks, 4));
        let s2 = dot(&vec_at(&qs, 4), &vec_at(&ks, 8));
        assert!((s1 - s2).abs() < 1e-4);
    }

    #[test]
    fn test_shape_mismatch() {
        let rot = GridRotary::new(8, 3, 3, 10000.0).unwrap();
        assert!(rot.apply(&Tensor::randn([1, 1, 8, 8])).is_err());
    }
}
