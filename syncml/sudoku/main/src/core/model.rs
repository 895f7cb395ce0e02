//! The Sudoku transformer: embedding, repeated-attention blocks, digit head.

use std::time::Instant;

use syncml_core::Tensor;
use syncml_nn::{param_name, positional_encoding_2d, Embedding, LayerNorm, Linear, Module};

use crate::api::error::{SudokuError, SudokuResult};
use crate::core::block::TransformerBlock;
use crate::core::board::SudokuBoard;
use crate::core::config::SudokuTransformerConfig;
use crate::core::encoding::{decode_boards, encode_batch, onehot_to_int};

pub(crate) const GRID: usize = 9;
pub(crate) const CELLS: usize = GRID * GRID;
/// Digit vocabulary: 0 (blank) through 9.
const VOCAB: usize = 10;

#[derive(Debug, Clone)]
pub struct SudokuTransformer {
    config: SudokuTransformerConfig,
    pub embedding: Embedding,
    /// Learned `[81, C]` positional embedding; absent when `gta` is set.
    pub pos_embed: Option<Tensor>,
    pub blocks: Vec<TransformerBlock>,
    pub out_norm: LayerNorm,
    pub out_proj: Linear,
}

impl SudokuTransformer {
    pub fn new(config: SudokuTransformerConfig) -> SudokuResult<Self> {
        config.validate()?;
        let embedding = Embedding::new(VOCAB, config.channels);
        let pos_embed = if config.gta {
            None
        } else {
            Some(positional_encoding_2d(config.channels, GRID, GRID)?)
        };
        let blocks = (0..config.blocks)
            .map(|_| TransformerBlock::new(&config, GRID, GRID))
            .collect::<SudokuResult<Vec<_>>>()?;
        let out_norm = LayerNorm::with_eps(config.channels, config.layer_norm_eps);
        let out_proj = Linear::new(config.channels, GRID);

        let model = Self { config, embedding, pos_embed, blocks, out_norm, out_proj };
        log::info!(
            "[sudoku] model channels={} blocks={} heads={} T={} gta={} params={}",
            model.config.channels,
            model.config.blocks,
            model.config.heads,
            model.config.repeats,
            model.config.gta,
            model.parameter_count()
        );
        Ok(model)
    }

    pub fn config(&self) -> &SudokuTransformerConfig {
        &self.config
    }

    /// Toggle dropout in every block.
    pub fn set_training(&mut self, training: bool) {
        for block in &mut self.blocks {
            if training {
                block.mlp.dropout.train();
            } else {
                block.mlp.dropout.eval();
            }
        }
    }

    /// `x [B, 9, 9, 9]` one-hot digits, `is_input [B, 9, 9]` → logits `[B, 9, 9, 9]`.
    ///
    /// `is_input` is shape-checked only; givens are already visible through
    /// the embedded digits.
    pub fn forward(&self, x: &Tensor, is_input: &Tensor) -> SudokuResult<Tensor> {
        let _t = if log::log_enabled!(log::Level::Debug) { Some(Instant::now()) } else { None };
        let batch = check_inputs(x, is_input)?;
        let channels = self.config.channels;

        let digits = onehot_to_int(x)?;
        let mut h = self
            .embedding
            .forward(&digits)?
            .reshape(&[batch, CELLS, channels])?;
        if let Some(ref pos) = self.pos_embed {
            h = h.add(pos)?;
        }
        for block in &self.blocks {
            h = block.forward(&h, self.config.repeats)?;
        }
        let logits = self
            .out_proj
            .forward(&self.out_norm.forward(&h)?)?
            .reshape(&[batch, GRID, GRID, GRID])?;

        if let Some(t) = _t {
            log::debug!("[perf] sudoku::forward B={} {:.3}ms",
                batch, t.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(logits)
    }

    /// Predicted digit per cell, `[B, 9, 9]` with values 1..=9.
    ///
    /// Cells marked in `is_input` keep their given digit.
    pub fn predict(&self, x: &Tensor, is_input: &Tensor) -> SudokuResult<Tensor> {
        let logits = self.forward(x, is_input)?;
        let predicted = logits.argmax(-1)?;
        let given = onehot_to_int(x)?;
        let digits: Vec<f32> = predicted
            .iter()
            .zip(given.iter())
            .zip(is_input.iter())
            .map(|((p, g), m)| if m > 0.5 && g > 0.0 { g } else { p + 1.0 })
            .collect();
        Ok(Tensor::from_vec(digits, predicted.shape().to_vec())?)
    }

    /// Encode, predict and decode a batch of boards.
    pub fn solve(&self, puzzles: &[SudokuBoard]) -> SudokuResult<Vec<SudokuBoard>> {
        let (x, is_input) = encode_batch(puzzles)?;
        decode_boards(&self.predict(&x, &is_input)?)
    }
}

fn check_inputs(x: &Tensor, is_input: &Tensor) -> SudokuResult<usize> {
    let xs = x.shape();
    if xs.len() != 4 || xs[1..] != [GRID, GRID, GRID] {
        return Err(SudokuError::ShapeMismatch(format!(
            "x must be [B, 9, 9, 9], got {:?}",
            xs
        )));
    }
    let batch = xs[0];
    if is_input.shape() != [batch, GRID, GRID] {
        return Err(SudokuError::ShapeMismatch(format!(
            "is_input must be [{}, 9, 9], got {:?}",
            batch,
            is_input.shape()
        )));
    }
    Ok(batch)
}

impl Module for SudokuTransformer {
    fn visit_parameters(&self, prefix: &str, f: &mut dyn FnMut(&str, &Tensor)) {
        self.embedding.visit_parameters(&param_name(prefix, "embedding"), f);
        if let Some(ref pos) = self.pos_embed {
            f(&param_name(prefix, "pos_embed"), pos);
        }
        for (i, block) in self.blocks.iter().enumerate() {
            block.visit_parameters(&param_name(prefix, &format!("transformer_encoder.{}", i)), f);
        }
        self.out_norm.visit_parameters(&param_name(prefix, "out.0"), f);
        self.out_proj.visit_parameters(&param_name(prefix, "out.1"), f);
    }

    fn visit_parameters_mut(&mut self, prefix: &str, f: &mut dyn FnMut(&str, &mut Tensor)) {
        self.embedding.visit_parameters_mut(&param_name(prefix, "embedding"), f);
        if let Some(ref mut pos) = self.pos_embed {
            f(&param_name(prefix, "pos_embed"), pos);
        }
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.visit_parameters_mut(&param_name(prefix, &format!("transformer_encoder.{}", i)), f);
        }
        self.out_norm.visit_parameters_mut(&param_name(prefix, "out.0"), f);
        self.out_proj.visit_parameters_mut(&param_name(prefix, "out.1"), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::tests::PUZZLE;
    use syncml_core::manual_seed;

    fn tiny(gta: bool) -> SudokuTransformerConfig {
        SudokuTransformerConfig {
            channels: 16,
            blocks: 2,
            heads: 2,
            mlp_dim: 32,
            repeats: 2,
            gta,
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_shape() {
        manual_seed(1);
        for gta in [false, true] {
            let model = SudokuTransformer::new(tiny(gta)).unwrap();
            assert_eq!(model.pos_embed.is_some(), !gta);
            let board: SudokuBoard = PUZZLE.parse().unwrap();
            let (x, m) = encode_batch(&[board.clone(), SudokuBoard::empty(), board]).unwrap();
            let logits = model.forward(&x, &m).unwrap();
            assert_eq!(logits.shape(), &[3, 9, 9, 9]);
            assert!(logits.iter().all(f32::is_finite));
        }
    }

    #[test]
    fn test_forward_rejects_bad_shapes() {
        let model = SudokuTransformer::new(tiny(false)).unwrap();
        let x = Tensor::zeros(vec![1, 9, 9, 8]);
        let m = Tensor::zeros(vec![1, 9, 9]);
        assert!(matches!(model.forward(&x, &m), Err(SudokuError::ShapeMismatch(_))));
        let x = Tensor::zeros(vec![1, 9, 9, 9]);
        let m = Tensor::zeros(vec![2, 9, 9]);
        assert!(matches!(model.forward(&x, &m), Err(SudokuError::ShapeMismatch(_))));
    }

    #[test]
    fn test_predict_keeps_givens() {
        manual_seed(2);
        let model = SudokuTransformer::new(tiny(false)).unwrap();
        let board: SudokuBoard = PUZZLE.parse().unwrap();
        let solved = model.solve(&[board.clone()]).unwrap();
        let out = &solved[0];
        assert!(out.is_complete());
        for (given, got) in board.cells().iter().zip(out.cells()) {
            if *given != 0 {
                assert_eq!(given, got);
            }
        }
    }

    #[test]
    fn test_pos_embed_starts_as_sinusoid() {
        let model = SudokuTransformer::new(tiny(false)).unwrap();
        let pos = model.pos_embed.as_ref().unwrap();
        assert_eq!(pos.shape(), &[81, 16]);
        assert_eq!(pos.to_vec(), positional_encoding_2d(16, 9, 9).unwrap().to_vec());
    }

    #[test]
    fn test_parameter_layout() {
        let model = SudokuTransformer::new(tiny(false)).unwrap();
        let mut names = Vec::new();
        model.visit_parameters("", &mut |n, _| names.push(n.to_string()));
        assert_eq!(names[0], "embedding.weight");
        assert_eq!(names[1], "pos_embed");
        assert_eq!(names[names.len() - 1], "out.1.bias");
        assert_eq!(names[names.len() - 4], "out.0.weight");

        let c = 16;
        let block = 2 * c + 4 * (c * c + c) + 2 * c + (c * 32 + 32) + (32 * c + c);
        let expected = 10 * c + 81 * c + 2 * block + 2 * c + (c * 9 + 9);
        assert_eq!(model.parameter_count(), expected);
    }
}
