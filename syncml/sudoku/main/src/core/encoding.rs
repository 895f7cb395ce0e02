//! Conversions between boards and model tensors.

use syncml_core::Tensor;

use crate::api::error::{SudokuError, SudokuResult};
use crate::core::board::SudokuBoard;

/// Stack boards into `(x [B, 9, 9, 9], is_input [B, 9, 9])`.
pub fn encode_batch(boards: &[SudokuBoard]) -> SudokuResult<(Tensor, Tensor)> {
    if boards.is_empty() {
        return Err(SudokuError::InvalidBoard("cannot encode an empty batch".into()));
    }
    let b = boards.len();
    let onehot: Vec<f32> = boards.iter().flat_map(|board| board.to_onehot()).collect();
    let mask: Vec<f32> = boards.iter().flat_map(|board| board.input_mask()).collect();
    Ok((
        Tensor::from_vec(onehot, vec![b, 9, 9, 9])?,
        Tensor::from_vec(mask, vec![b, 9, 9])?,
    ))
}

/// Digit index per cell: `argmax + 1` for one-hot cells, 0 for all-zero cells.
///
/// `x` has shape `[..., 9]`; the result drops the last dimension.
pub fn onehot_to_int(x: &Tensor) -> SudokuResult<Tensor> {
    if x.shape().last() != Some(&9) {
        return Err(SudokuError::ShapeMismatch(format!(
            "one-hot digits need a trailing dimension of 9, got {:?}",
            x.shape()
        )));
    }
    let idx = x.argmax(-1)?;
    let present = x.sum(-1)?;
    let digits: Vec<f32> = idx
        .iter()
        .zip(present.iter())
        .map(|(i, s)| if s > 0.0 { i + 1.0 } else { 0.0 })
        .collect();
    Ok(Tensor::from_vec(digits, idx.shape().to_vec())?)
}

/// Split a `[B, 9, 9]` digit tensor back into boards.
pub fn decode_boards(digits: &Tensor) -> SudokuResult<Vec<SudokuBoard>> {
    let shape = digits.shape();
    if shape.len() != 3 || shape[1] != 9 || shape[2] != 9 {
        return Err(SudokuError::ShapeMismatch(format!(
            "expected [B, 9, 9] digits, got {:?}",
            shape
        )));
    }
    let values = digits.to_vec();
    values
        .chunks(81)
        .map(|chunk| {
            let mut cells = [0u8; 81];
            for (cell, &v) in cells.iter_mut().zip(chunk) {
                if !(0.0..=9.0).contains(&v) || v.fract() != 0.0 {
                    return Err(SudokuError::InvalidBoard(format!("cell value {} is not a digit", v)));
                }
                *cell = v as u8;
            }
            SudokuBoard::from_cells(cells)
        })
        .collect()
}
