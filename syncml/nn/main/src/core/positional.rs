use crate::api::error::{NnError, NnResult};
use syncml_core::Tensor;

/// Sinusoidal 2D positional encoding for an `height x width` grid.
///
/// Returns `[height * width, d_model]` with tokens in row-major order. The
/// first `d_model / 2` channels encode the column, interleaving
/// `sin(col * f_i)` and `cos(col * f_i)`; the second half encodes the row the
/// same way. `f_i = exp(-2i * ln(10000) / (d_model / 2))`.
pub fn positional_encoding_2d(d_model: usize, height: usize, width: usize) -> NnResult<Tensor> {
    if d_model == 0 || d_model % 4 != 0 {
        return Err(NnError::InvalidConfig(format!(
            "2D positional encoding requires d_model divisible by 4, got {}",
            d_model
        )));
    }

    let half = d_model / 2;
    let div_term: Vec<f32> = (0..half / 2)
        .map(|i| (2.0 * i as f32 * -(10000.0f32.ln() / half as f32)).exp())
        .collect();

    let mut data = vec![0.0f32; height * width * d_model];
    for row in 0..height {
        for col in 0..width {
            let token = &mut data[(row * width + col) * d_model..(row * width + col + 1) * d_model];
            for (i, &freq) in div_term.iter().enumerate() {
                token[2 * i] = (col as f32 * freq).sin();
                token[2 * i + 1] = (col as f32 * freq).cos();
                token[half + 2 * i] = (row as f32 * freq).sin();
                token[half + 2 * i + 1] = (row as f32 * freq).cos();
            }
        }
    }

    Ok(Tensor::from_vec(data, vec![height * width, d_model])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_divisibility() {
        assert_eq!(positional_encoding_2d(64, 9, 9).unwrap().shape(), &[81, 64]);
        assert!(positional_encoding_2d(6, 9, 9).is_err());
    }

    #[test]
    fn test_origin_alternates_zero_one() {
        let pe = positional_encoding_2d(8, 3, 3).unwrap();
        assert_eq!(
            pe.select(0, 0).unwrap().to_vec(),
            vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_column_and_row_halves() {
        let pe = positional_encoding_2d(8, 3, 3).unwrap();
        // token (row 0, col 1): first channel is sin(1 * f_0) = sin(1).
        let t01 = pe.select(0, 1).unwrap().to_vec();
        assert!((t01[0] - 1.0f32.sin()).abs() < 1e-6);
        assert_eq!(t01[4], 0.0);
        // token (row 1, col 0): row half carries the position.
        let t10 = pe.select(0, 3).unwrap().to_vec();
        assert_eq!(t10[0], 0.0);
        assert!((t10[4] - 1.0f32.sin()).abs() < 1e-6);
    }
}
