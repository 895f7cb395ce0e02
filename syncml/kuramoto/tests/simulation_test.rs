use std::f64::consts::TAU;

use syncml_kuramoto::{CouplingMode, KuramotoConfig, KuramotoNetwork};

#[test]
fn test_history_records_state_before_each_step() {
    let config = KuramotoConfig { steps: 50, seed: Some(42), ..Default::default() };
    let mut network = KuramotoNetwork::from_config(&config).unwrap();
    let initial = network.phases().to_vec();

    let history = network.simulate(config.steps, config.dt).unwrap();
    assert_eq!(history.len(), 50);
    assert_eq!(history.num_oscillators(), 3);
    assert_eq!(history.row(0).unwrap(), initial.as_slice());
    assert_ne!(history.row(49).unwrap(), network.phases());
}

#[test]
fn test_phases_stay_wrapped() {
    let config = KuramotoConfig {
        num_oscillators: 6,
        dt: 0.5,
        steps: 500,
        omega_range: [5.0, 9.0],
        seed: Some(1),
        ..Default::default()
    };
    let mut network = KuramotoNetwork::from_config(&config).unwrap();
    let history = network.simulate(config.steps, config.dt).unwrap();
    for row in history.rows() {
        assert!(row.iter().all(|t| (0.0..TAU).contains(t)));
    }
}

#[test]
fn test_zero_steps_gives_empty_history() {
    let mut network = KuramotoNetwork::from_config(&KuramotoConfig { seed: Some(0), ..Default::default() }).unwrap();
    let before = network.phases().to_vec();
    let history = network.simulate(0, 0.01).unwrap();
    assert!(history.is_empty());
    assert_eq!(network.phases(), before.as_slice());
}

#[test]
fn test_attractive_coupling_synchronizes() {
    let n = 4;
    let mut network = KuramotoNetwork::from_parts(
        vec![0.1, 1.3, 2.0, 2.9],
        vec![1.0; n],
        vec![1.0; n * n],
        CouplingMode::Attractive,
    )
    .unwrap();
    let (r0, _) = network.order_parameter();
    let history = network.simulate(3000, 0.01).unwrap();
    let (r1, _) = network.order_parameter();
    assert!(r1 > r0);
    assert!(r1 > 0.999, "r = {}", r1);
    let rs = history.order_parameters();
    assert_eq!(rs.len(), 3000);
    assert!((rs[0] - r0).abs() < 1e-12);
}

#[test]
fn test_same_seed_same_trajectory() {
    let config = KuramotoConfig { steps: 100, seed: Some(7), ..Default::default() };
    let a = KuramotoNetwork::from_config(&config).unwrap().simulate(100, 0.01).unwrap();
    let b = KuramotoNetwork::from_config(&config).unwrap().simulate(100, 0.01).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_exports_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = KuramotoConfig { steps: 20, seed: Some(3), ..Default::default() };
    let history = KuramotoNetwork::from_config(&config)
        .unwrap()
        .simulate(config.steps, config.dt)
        .unwrap();

    let csv_path = dir.path().join("phases.csv");
    history.save_csv(&csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 21);
    assert!(csv.starts_with("step,time,theta_1,theta_2,theta_3\n"));

    let svg_path = dir.path().join("phases.svg");
    history.save_svg(&svg_path, "Kuramoto Model Simulation").unwrap();
    let svg = std::fs::read_to_string(&svg_path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains("Kuramoto Model Simulation"));
    assert!(svg.contains("Time Step"));
    assert!(svg.contains("Phase (radians)"));
    assert_eq!(svg.matches("<polyline").count(), 3);
    assert!(svg.contains("Oscillator 3"));
}
