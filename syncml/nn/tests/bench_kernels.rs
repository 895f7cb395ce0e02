//! Micro-benchmarks for the parallel kernels and attention variants.
//! Run with: cargo test --release -p syncml-nn --test bench_kernels -- --nocapture

use std::time::Instant;

use syncml_core::{manual_seed, RuntimeConfig, Tensor};
use syncml_nn::{MultiHeadAttention, Module};

#[test]
fn bench_all_kernels() {
    println!("\n=== Kernel Micro-Benchmarks ===\n");
    manual_seed(0);
    bench_softmax_threshold();
    bench_batched_matmul_threshold();
    bench_attention_variants();
    RuntimeConfig::default().apply().unwrap();
    println!("=== Done ===\n");
}

fn with_thresholds(row: usize, matmul: usize) {
    RuntimeConfig {
        num_threads: 0,
        row_par_threshold: row,
        matmul_par_threshold: matmul,
    }
    .apply()
    .unwrap();
}

fn max_abs_diff(a: &Tensor, b: &Tensor) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f32::max)
}

fn bench_softmax_threshold() {
    println!("--- 1. Softmax sequential vs rayon ---");
    let x = Tensor::randn([4, 81, 81]);

    with_thresholds(usize::MAX, 4096);
    let start = Instant::now();
    let seq = x.softmax(-1).unwrap();
    let seq_ms = start.elapsed().as_secs_f64() * 1000.0;

    with_thresholds(0, 4096);
    let start = Instant::now();
    let par = x.softmax(-1).unwrap();
    let par_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("  sequential {:.3}ms, rayon {:.3}ms", seq_ms, par_ms);
    assert!(max_abs_diff(&seq, &par) < 1e-6);
}

fn bench_batched_matmul_threshold() {
    println!("--- 2. Batched matmul sequential vs rayon ---");
    let a = Tensor::randn([2, 4, 81, 16]);
    let b = Tensor::randn([2, 4, 16, 81]);

    with_thresholds(4096, usize::MAX);
    let start = Instant::now();
    let seq = a.matmul(&b).unwrap();
    let seq_ms = start.elapsed().as_secs_f64() * 1000.0;

    with_thresholds(4096, 0);
    let start = Instant::now();
    let par = a.matmul(&b).unwrap();
    let par_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("  sequential {:.3}ms, rayon {:.3}ms", seq_ms, par_ms);
    assert_eq!(seq.shape(), &[2, 4, 81, 81]);
    assert!(max_abs_diff(&seq, &par) < 1e-4);
}

fn bench_attention_variants() {
    println!("--- 3. Attention: plain vs grid rotary ---");
    with_thresholds(4096, 4096);
    let x = Tensor::randn([2, 81, 64]);

    let plain = MultiHeadAttention::new(64, 4).unwrap();
    let rotary = plain.clone().with_grid_rotary(9, 9, 10000.0).unwrap();
    assert_eq!(plain.parameter_count(), rotary.parameter_count());

    for (name, attn) in [("plain", &plain), ("grid rotary", &rotary)] {
        let start = Instant::now();
        let y = attn.forward(&x).unwrap();
        println!("  {:<12} {:.3}ms", name, start.elapsed().as_secs_f64() * 1000.0);
        assert_eq!(y.shape(), &[2, 81, 64]);
        assert!(y.iter().all(f32::is_finite));
    }
}
