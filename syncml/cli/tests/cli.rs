use std::process::{Command, Output};

use tempfile::tempdir;

const PUZZLE: &str =
    "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";

fn syncml(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_syncml"))
        .args(args)
        .output()
        .expect("failed to spawn syncml")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_kuramoto_writes_csv_and_plot() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("phases.csv");
    let svg = dir.path().join("phases.svg");

    let out = syncml(&[
        "kuramoto",
        "--oscillators", "4",
        "--steps", "25",
        "--seed", "7",
        "--csv", csv.to_str().unwrap(),
        "--plot", svg.to_str().unwrap(),
        "--title", "Four <Oscillators>",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("oscillators=4"));
    assert!(text.contains("theta_4"));

    let csv_text = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines[0], "step,time,theta_1,theta_2,theta_3,theta_4");
    assert_eq!(lines.len(), 26);

    let svg_text = std::fs::read_to_string(&svg).unwrap();
    assert!(svg_text.starts_with("<svg"));
    assert!(svg_text.contains("Four &lt;Oscillators&gt;"));
    assert_eq!(svg_text.matches("<polyline").count(), 4);
}

#[test]
fn test_kuramoto_seed_is_reproducible() {
    let args = ["kuramoto", "--oscillators", "3", "--steps", "40", "--seed", "3", "--attractive"];
    let a = syncml(&args);
    let b = syncml(&args);
    assert!(a.status.success());
    assert_eq!(stdout(&a), stdout(&b));
    assert!(stdout(&a).contains("Attractive"));
}

#[test]
fn test_kuramoto_config_file_and_bad_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sim.json");
    std::fs::write(&path, r#"{"num_oscillators": 2, "steps": 10, "seed": 1}"#).unwrap();

    let out = syncml(&["kuramoto", "--config", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("oscillators=2 steps=10"));

    let out = syncml(&["kuramoto", "--dt", "0", "--steps", "5"]);
    assert!(!out.status.success());
}

#[test]
fn test_sudoku_prints_shape_and_grid() {
    let dir = tempdir().unwrap();
    let weights = dir.path().join("model.safetensors");

    let out = syncml(&[
        "sudoku",
        "--puzzle", PUZZLE,
        "--seed", "1",
        "--channels", "16",
        "--blocks", "1",
        "--heads", "2",
        "--mlp-dim", "32",
        "--repeats", "2",
        "--gta",
        "--save-weights", weights.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = stdout(&out);
    assert!(text.contains("logits shape: [1, 9, 9, 9]"));
    let grid: Vec<&str> = text.lines().skip(1).take(9).collect();
    assert_eq!(grid.len(), 9);
    assert!(grid[0].starts_with("53"));
    assert!(grid.iter().all(|row| row.len() == 9 && !row.contains('.')));
    assert!(weights.exists());

    // Reloading the saved weights gives the same prediction.
    let again = syncml(&[
        "sudoku",
        "--puzzle", PUZZLE,
        "--channels", "16",
        "--blocks", "1",
        "--heads", "2",
        "--mlp-dim", "32",
        "--repeats", "2",
        "--gta",
        "--weights", weights.to_str().unwrap(),
    ]);
    assert!(again.status.success());
    assert_eq!(stdout(&again), text);
}

#[test]
fn test_sudoku_rejects_bad_puzzle() {
    let out = syncml(&["sudoku", "--puzzle", "123"]);
    assert!(!out.status.success());

    let conflicting = format!("55{}", ".".repeat(79));
    let out = syncml(&["sudoku", "--puzzle", &conflicting, "--channels", "16", "--heads", "2"]);
    assert!(!out.status.success());
}
