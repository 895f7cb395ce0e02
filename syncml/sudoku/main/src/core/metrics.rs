use crate::api::error::{SudokuError, SudokuResult};
use crate::core::board::SudokuBoard;

/// Accuracy of predicted boards against known solutions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SudokuMetrics {
    /// Fraction of blank puzzle cells predicted correctly.
    pub cell_accuracy: f64,
    /// Fraction of boards predicted entirely correctly.
    pub board_accuracy: f64,
    pub blank_cells: usize,
    pub correct_cells: usize,
    pub boards: usize,
    pub solved_boards: usize,
}

impl SudokuMetrics {
    pub fn evaluate(
        predictions: &[SudokuBoard],
        solutions: &[SudokuBoard],
        puzzles: &[SudokuBoard],
    ) -> SudokuResult<Self> {
        if predictions.is_empty()
            || predictions.len() != solutions.len()
            || predictions.len() != puzzles.len()
        {
            return Err(SudokuError::InvalidBoard(format!(
                "need equal non-empty batches, got {} predictions, {} solutions, {} puzzles",
                predictions.len(),
                solutions.len(),
                puzzles.len()
            )));
        }

        let (mut blank_cells, mut correct_cells, mut solved_boards) = (0, 0, 0);
        for ((pred, sol), puzzle) in predictions.iter().zip(solutions).zip(puzzles) {
            for ((p, s), q) in pred.cells().iter().zip(sol.cells()).zip(puzzle.cells()) {
                if *q == 0 {
                    blank_cells += 1;
                    if p == s {
                        correct_cells += 1;
                    }
                }
            }
            if pred == sol {
                solved_boards += 1;
            }
        }

        let boards = predictions.len();
        let cell_accuracy = if blank_cells == 0 {
            1.0
        } else {
            correct_cells as f64 / blank_cells as f64
        };
        Ok(Self {
            cell_accuracy,
            board_accuracy: solved_boards as f64 / boards as f64,
            blank_cells,
            correct_cells,
            boards,
            solved_boards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::tests::{PUZZLE, SOLUTION};

    #[test]
    fn test_perfect_and_partial() {
        let puzzle: SudokuBoard = PUZZLE.parse().unwrap();
        let solution: SudokuBoard = SOLUTION.parse().unwrap();

        let m = SudokuMetrics::evaluate(&[solution.clone()], &[solution.clone()], &[puzzle.clone()]).unwrap();
        assert_eq!(m.cell_accuracy, 1.0);
        assert_eq!(m.board_accuracy, 1.0);
        assert_eq!(m.blank_cells, 51);

        // Predicting only the givens leaves every blank wrong.
        let m = SudokuMetrics::evaluate(&[puzzle.clone(), solution.clone()], &[solution.clone(), solution.clone()], &[puzzle.clone(), puzzle]).unwrap();
        assert_eq!(m.correct_cells, 51);
        assert_eq!(m.blank_cells, 102);
        assert_eq!(m.cell_accuracy, 0.5);
        assert_eq!(m.board_accuracy, 0.5);
    }

    #[test]
    fn test_mismatched_batches() {
        let b = SudokuBoard::empty();
        assert!(SudokuMetrics::evaluate(&[], &[], &[]).is_err());
        assert!(SudokuMetrics::evaluate(&[b.clone()], &[b.clone(), b.clone()], &[b]).is_err());
    }
}
