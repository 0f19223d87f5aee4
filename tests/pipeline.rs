//! Generator output driven through the reservoir end to end.

use ndarray::{Array1, s};

use mackey_esn::{
    envs::mackey_glass::MackeyGlass,
    experiment::{self, ExperimentConfig},
    nn::esn::{EsnConfig, Mode},
    util::{bench::Bench, io},
};

/// Unit-step Mackey-Glass series with the start-up transient removed.
fn mackey_series(len: usize) -> Array1<f64> {
    MackeyGlass {
        horizon: (500 + len) * 10,
        ..MackeyGlass::default()
    }
    .generate()
    .unwrap()
    .downsample(5_000, 10)
    .saturated()
}

fn config(mode: Mode) -> ExperimentConfig {
    ExperimentConfig {
        esn: EsnConfig {
            reservoir_size: 100,
            seed: Some(42),
            ..EsnConfig::default()
        },
        train_len: 1_000,
        test_len: 200,
        init_len: 100,
        error_len: 200,
        mode,
    }
}

#[test]
fn prediction_beats_persistence() {
    let series = mackey_series(1_300);
    let outcome = experiment::run(&config(Mode::Prediction), &series).unwrap();

    // predicting y[t+1] = y[t]
    let truth = series.slice(s![1_001..1_201]);
    let persistence = series.slice(s![1_000..1_200]);
    let baseline = Bench::mse(truth, persistence).unwrap();

    assert_eq!(outcome.seed, Some(42));
    assert!(outcome.mse < 1e-3, "mse {}", outcome.mse);
    assert!(
        outcome.mse < 0.1 * baseline,
        "mse {} vs persistence {baseline}",
        outcome.mse
    );
}

#[test]
fn fixed_seed_replays_exactly() {
    let series = mackey_series(1_300);
    let a = experiment::run(&config(Mode::Prediction), &series).unwrap();
    let b = experiment::run(&config(Mode::Prediction), &series).unwrap();

    assert_eq!(a.readout, b.readout);
    assert_eq!(a.outputs, b.outputs);
    assert_eq!(a.mse.to_bits(), b.mse.to_bits());
}

#[test]
fn saved_series_feeds_both_modes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mackey.txt");
    io::save_series(&path, &mackey_series(1_300)).unwrap();
    let series = io::load_series(&path).unwrap();

    let generative = ExperimentConfig {
        test_len: 50,
        error_len: 50,
        ..config(Mode::Generative)
    };
    let predicted = experiment::run(&config(Mode::Prediction), &series).unwrap();
    let generated = experiment::run(&generative, &series).unwrap();

    // same model, same first input
    assert_eq!(predicted.outputs[0].to_bits(), generated.outputs[0].to_bits());
    assert!(generated.outputs.iter().all(|v| v.is_finite()));
    assert!(generated.mse.is_finite());
}

#[test]
fn horizon_past_the_data_is_rejected() {
    let series = mackey_series(1_150);
    assert!(experiment::run(&config(Mode::Prediction), &series).is_err());
}
