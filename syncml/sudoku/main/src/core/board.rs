//! Sudoku grid parsing, validation and one-hot encoding.

use std::fmt;
use std::str::FromStr;

use crate::api::error::{SudokuError, SudokuResult};

/// A 9x9 grid of digits, 0 for a blank cell. Cells are row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SudokuBoard {
    cells: [u8; 81],
}

impl SudokuBoard {
    pub fn from_cells(cells: [u8; 81]) -> SudokuResult<Self> {
        if let Some((i, &d)) = cells.iter().enumerate().find(|&(_, &d)| d > 9) {
            return Err(SudokuError::InvalidBoard(format!(
                "cell {} holds {}, expected 0-9",
                i, d
            )));
        }
        Ok(Self { cells })
    }

    pub fn empty() -> Self {
        Self { cells: [0; 81] }
    }

    pub fn cells(&self) -> &[u8; 81] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * 9 + col]
    }

    pub fn num_givens(&self) -> usize {
        self.cells.iter().filter(|&&d| d != 0).count()
    }

    /// No blank cells.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&d| d != 0)
    }

    /// No digit repeats within any row, column or 3x3 box. Blanks are ignored.
    pub fn is_valid(&self) -> bool {
        (0..9).all(|k| {
            let row = (0..9).map(|c| self.get(k, c));
            let col = (0..9).map(|r| self.get(r, k));
            let (br, bc) = (k / 3 * 3, k % 3 * 3);
            let boxed = (0..9).map(|i| self.get(br + i / 3, bc + i % 3));
            no_repeats(row) && no_repeats(col) && no_repeats(boxed)
        })
    }

    pub fn is_solved(&self) -> bool {
        self.is_complete() && self.is_valid()
    }

    /// `[9, 9, 9]` one-hot digits (`d` sets class `d - 1`); blanks are all zero.
    pub fn to_onehot(&self) -> Vec<f32> {
        let mut out = vec![0.0f32; 81 * 9];
        for (i, &d) in self.cells.iter().enumerate() {
            if d != 0 {
                out[i * 9 + d as usize - 1] = 1.0;
            }
        }
        out
    }

    /// `[9, 9]` mask with 1 on given cells.
    pub fn input_mask(&self) -> Vec<f32> {
        self.cells.iter().map(|&d| if d != 0 { 1.0 } else { 0.0 }).collect()
    }
}

fn no_repeats(digits: impl Iterator<Item = u8>) -> bool {
    let mut seen = [false; 10];
    for d in digits.filter(|&d| d != 0) {
        if seen[d as usize] {
            return false;
        }
        seen[d as usize] = true;
    }
    true
}

impl FromStr for SudokuBoard {
    type Err = SudokuError;

    /// Accepts `1`-`9`, `0` or `.` for blanks; whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [0u8; 81];
        let mut count = 0;
        for ch in s.chars().filter(|c| !c.is_whitespace()) {
            let digit = match ch {
                '.' => 0,
                '0'..='9' => ch as u8 - b'0',
                other => {
                    return Err(SudokuError::InvalidBoard(format!(
                        "unexpected character {:?}",
                        other
                    )))
                }
            };
            if count == 81 {
                return Err(SudokuError::InvalidBoard("more than 81 cells".into()));
            }
            cells[count] = digit;
            count += 1;
        }
        if count != 81 {
            return Err(SudokuError::InvalidBoard(format!("expected 81 cells, got {}", count)));
        }
        Ok(Self { cells })
    }
}

impl fmt::Display for SudokuBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..9 {
            for col in 0..9 {
                match self.get(row, col) {
                    0 => write!(f, ".")?,
                    d => write!(f, "{}", d)?,
                }
            }
            if row < 8 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PUZZLE: &str =
        "530070000600195000098000060800060003400803001700020006060000280000419005000080079";
    pub(crate) const SOLUTION: &str =
        "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

    #[test]
    fn test_parse_and_display() {
        let board: SudokuBoard = PUZZLE.parse().unwrap();
        assert_eq!(board.get(0, 0), 5);
        assert_eq!(board.get(0, 2), 0);
        assert_eq!(board.num_givens(), 30);
        let shown = board.to_string();
        assert_eq!(shown.lines().count(), 9);
        assert_eq!(shown.lines().next(), Some("53..7...."));
        let reparsed: SudokuBoard = shown.parse().unwrap();
        assert_eq!(reparsed, board);
    }

    #[test]
    fn test_parse_errors() {
        assert!("123".parse::<SudokuBoard>().is_err());
        assert!(format!("{}x", &PUZZLE[..80]).parse::<SudokuBoard>().is_err());
        assert!(format!("{}1", PUZZLE).parse::<SudokuBoard>().is_err());
    }

    #[test]
    fn test_validity() {
        let puzzle: SudokuBoard = PUZZLE.parse().unwrap();
        let solution: SudokuBoard = SOLUTION.parse().unwrap();
        assert!(puzzle.is_valid());
        assert!(!puzzle.is_complete());
        assert!(solution.is_solved());

        let mut cells = *solution.cells();
        cells.swap(0, 1);
        let broken = SudokuBoard::from_cells(cells).unwrap();
        assert!(broken.is_complete());
        assert!(!broken.is_valid());
    }

    #[test]
    fn test_onehot_and_mask() {
        let board: SudokuBoard = PUZZLE.parse().unwrap();
        let onehot = board.to_onehot();
        assert_eq!(onehot.len(), 729);
        assert_eq!(onehot[4], 1.0); // cell 0 holds 5
        assert!(onehot[18..27].iter().all(|&v| v == 0.0)); // cell 2 is blank
        let mask = board.input_mask();
        assert_eq!(mask[0], 1.0);
        assert_eq!(mask[2], 0.0);
        assert!(SudokuBoard::from_cells([10; 81]).is_err());
    }
}
