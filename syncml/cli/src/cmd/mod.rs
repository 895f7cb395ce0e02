pub mod kuramoto;
pub mod sudoku;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Simulate a Kuramoto oscillator network and export its phase history.
    Kuramoto(kuramoto::KuramotoArgs),

    /// Run the recurrent-attention transformer on a Sudoku puzzle.
    Sudoku(sudoku::SudokuArgs),
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Kuramoto(args) => kuramoto::run(args),
        Command::Sudoku(args) => sudoku::run(args),
    }
}
