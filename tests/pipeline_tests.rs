/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

mod common;

use approx::assert_relative_eq;
use clap::Parser;
use rstest::rstest;
use tempfile::tempdir;

use lasdia_rs::cli::{self, Cli};
use lasdia_rs::grid::{MomentumGrid, QRanges, RangeMasks};
use lasdia_rs::input;
use lasdia_rs::pipeline::Pipeline;
use lasdia_rs::refine::Parameters;

#[rstest]
#[case(0.0, 90.0, 100.0)]
#[case(3.0, 90.0, 100.0)]
#[case(12.5, 12.5, 60.0)]
#[case(-1.0, 200.0, 300.0)]
fn test_masks_partition_the_validation_range(
    #[case] min_q: f64,
    #[case] q_max_integrate: f64,
    #[case] max_q: f64,
) {
    let grid = MomentumGrid::uniform(0.0, 110.0, 441).unwrap();
    let ranges = QRanges::new(min_q, q_max_integrate, max_q).unwrap();
    let masks = RangeMasks::new(&grid, ranges).unwrap();

    let (low, calc, tail) = (masks.low(), masks.calc(), masks.tail());
    assert_eq!(low.end, calc.start);
    assert_eq!(calc.end, tail.start);
    assert_eq!(low.start, masks.validation().start);
    assert_eq!(tail.end, masks.validation().end);

    let q = grid.values();
    assert!(q[low].iter().all(|&v| v <= min_q));
    assert!(q[calc].iter().all(|&v| v > min_q && v <= q_max_integrate));
    assert!(q[tail].iter().all(|&v| v > q_max_integrate && v <= max_q));
}

#[test]
fn test_flat_argon_run_from_files() {
    let dir = tempdir().unwrap();
    let path = common::write_flat_argon_run(dir.path());

    let (config, inputs) = input::load(&path).unwrap();
    assert_eq!(inputs.sample.len(), 201);
    assert!(inputs.background.intensity().iter().all(|&b| b == 0.0));

    let pipeline = Pipeline::from_config(&config, &inputs).unwrap();
    let analysis = pipeline
        .optimize(config.initial_parameters(), config.search, config.driver)
        .unwrap();

    let minimization = &analysis.minimization;
    assert!(minimization.converged);
    assert_eq!(minimization.iterations, 1);
    assert_eq!(minimization.parameters.density, 0.0);
    assert_relative_eq!(minimization.parameters.scale_factor, 1.0);

    let state = &analysis.state;
    assert_relative_eq!(state.alpha, 1.0, epsilon = 1e-12);
    for &s in &state.s_q[1..] {
        assert_relative_eq!(s, 1.0, epsilon = 1e-12);
    }
    assert!(state.f_r.f.iter().all(|&f| f.abs() < 1e-9));
    assert!(state.chi_square.abs() < 1e-12);
}

#[test]
fn test_density_is_penalized_for_flat_data() {
    let dir = tempdir().unwrap();
    let path = common::write_flat_argon_run(dir.path());
    let (config, inputs) = input::load(&path).unwrap();
    let pipeline = Pipeline::from_config(&config, &inputs).unwrap();

    let at_zero = pipeline.evaluate(&Parameters::new(1.0, 0.0)).unwrap();
    let dense = pipeline.evaluate(&Parameters::new(1.0, 30.0)).unwrap();
    assert!(dense.chi_square > at_zero.chi_square);
    assert!(dense.alpha < at_zero.alpha);
}

#[test]
fn test_cli_writes_structure_factor() {
    let dir = tempdir().unwrap();
    let path = common::write_flat_argon_run(dir.path());
    let output = dir.path().join("sq.json");

    let args = Cli::try_parse_from([
        "lasdia",
        "sq",
        path.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();
    cli::run(&args).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_relative_eq!(report["alpha"].as_f64().unwrap(), 1.0, epsilon = 1e-12);
    assert_eq!(report["q"].as_array().unwrap().len(), 201);
}

#[test]
fn test_missing_sample_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = common::write_flat_argon_run(dir.path());
    std::fs::remove_file(dir.path().join("ar.dat")).unwrap();
    assert!(input::load(&path).is_err());
}
