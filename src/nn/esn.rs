use std::{fmt, str::FromStr};

use ndarray::{Array1, Array2, ArrayView1, array, s};
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result, sum_lengths},
    f, linalg,
    optim::readout::{Readout, ReadoutMethod},
    util::{bench::Bench, seed::Seeded},
};

/// Where the next input comes from once the readout is trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Teacher forcing: the next ground-truth sample.
    Prediction,
    /// Free running: the network's own previous output.
    Generative,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "prediction" => Ok(Mode::Prediction),
            "generative" => Ok(Mode::Generative),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Prediction => write!(f, "prediction"),
            Mode::Generative => write!(f, "generative"),
        }
    }
}

/// Parameters of the echo state network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsnConfig {
    /// Number of units in the reservoir
    pub reservoir_size: usize,
    /// Weight of the new activation in the leaky integration, in (0, 1]
    pub leak_rate: f64,
    /// Largest eigenvalue modulus the recurrent matrix is rescaled to
    pub spectral_radius: f64,
    /// Multiplies the input projection
    pub input_scaling: f64,
    /// Ridge coefficient, `None` fits the readout with the pseudo-inverse
    pub regularization: Option<f64>,
    /// Seed for the weight draws, the clock is used when absent
    pub seed: Option<u64>,
}

impl Default for EsnConfig {
    fn default() -> Self {
        Self {
            reservoir_size: 300,
            leak_rate: 0.3,
            spectral_radius: 1.25,
            input_scaling: 1.,
            regularization: Some(1e-8),
            seed: None,
        }
    }
}

impl EsnConfig {
    pub fn validate(&self) -> Result<()> {
        if self.reservoir_size == 0 {
            return Err(Error::invalid_config("reservoir_size must be at least 1"));
        }

        if !(self.leak_rate > 0. && self.leak_rate <= 1.) {
            return Err(Error::invalid_config(format!(
                "leak_rate must be in (0, 1], got {}",
                self.leak_rate
            )));
        }

        if !self.spectral_radius.is_finite() || self.spectral_radius < 0. {
            return Err(Error::invalid_config(format!(
                "spectral_radius must be finite and non-negative, got {}",
                self.spectral_radius
            )));
        }

        if !self.input_scaling.is_finite() {
            return Err(Error::invalid_config("input_scaling must be finite"));
        }

        if let Some(reg) = self.regularization {
            if !reg.is_finite() || reg < 0. {
                return Err(Error::invalid_config(format!(
                    "regularization must be finite and non-negative, got {reg}"
                )));
            }
        }

        Ok(())
    }
}

/// Reservoir with fixed random weights and no readout yet.
#[derive(Debug, Clone)]
pub struct Esn {
    config: EsnConfig,
    seed: Option<u64>,
    w_in: Array2<f64>,
    w: Array2<f64>,
}

/// States and targets collected over a training segment.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// `[1; u; x]` per retained step, one column each
    pub design: Array2<f64>,
    /// Next sample of the series for each column, shape `1 × columns`
    pub targets: Array2<f64>,
    /// Reservoir state after the last training step
    pub state: Array1<f64>,
}

impl Esn {
    /// Draw the weights from the configured seed, or from the clock.
    pub fn new(config: EsnConfig) -> Result<Self> {
        config.validate()?;

        let Seeded { mut rng, seed } = Seeded::new(config.seed);
        let mut esn = Self::with_rng(config, &mut rng)?;
        esn.seed = seed;

        Ok(esn)
    }

    /// Draw the weights from a caller-supplied source.
    ///
    /// The reported seed is `None` since the source's origin is unknown here.
    pub fn with_rng<R: Rng + ?Sized>(config: EsnConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let n = config.reservoir_size;
        let w_in =
            Array2::random_using((n, 2), Uniform::new(-0.5, 0.5), &mut *rng) * config.input_scaling;
        let mut w = Array2::random_using((n, n), Uniform::new(-0.5, 0.5), &mut *rng);

        let drawn = linalg::spectral_radius(&w)?;
        if drawn == 0. {
            return Err(Error::Numerical(
                "recurrent matrix has zero spectral radius and cannot be rescaled".into(),
            ));
        }
        w *= config.spectral_radius / drawn;

        info!(
            reservoir_size = n,
            drawn_radius = drawn,
            target_radius = config.spectral_radius,
            "initialized reservoir"
        );

        Ok(Self {
            config,
            seed: None,
            w_in,
            w,
        })
    }

    /// Seed the weights were drawn with, if replayable.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn w_in(&self) -> &Array2<f64> {
        &self.w_in
    }

    pub fn w(&self) -> &Array2<f64> {
        &self.w
    }

    pub fn spectral_radius(&self) -> Result<f64> {
        linalg::spectral_radius(&self.w)
    }

    /// One leaky-integrator update, `(1-a)x + a·tanh(Win·[1;u] + W·x)`.
    pub fn step(&self, state: &Array1<f64>, input: f64) -> Array1<f64> {
        let a = self.config.leak_rate;
        let drive = self.w_in.dot(&array![1., input]) + self.w.dot(state);

        state * (1. - a) + f::tanh(&drive) * a
    }

    /// Drive the reservoir from a zero state over `series[..train_len]`,
    /// keeping every step from `init_len` on.
    pub fn harvest(
        &self,
        series: &Array1<f64>,
        train_len: usize,
        init_len: usize,
    ) -> Result<Harvest> {
        if init_len >= train_len {
            return Err(Error::invalid_config(format!(
                "init_len ({init_len}) must be smaller than train_len ({train_len})"
            )));
        }

        // the last training step is fitted against series[train_len]
        let required = sum_lengths(train_len, 1)?;
        if series.len() < required {
            return Err(Error::insufficient_data(required, series.len()));
        }

        if let Some(step) = series.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFinite { step });
        }

        let n = self.config.reservoir_size;
        let columns = train_len - init_len;

        let mut design = Array2::zeros((n + 2, columns));
        let targets = Array2::from_shape_fn((1, columns), |(_, j)| series[init_len + 1 + j]);
        let mut state = Array1::zeros(n);

        for t in 0..train_len {
            let u = series[t];
            state = self.step(&state, u);

            if t >= init_len {
                design.column_mut(t - init_len).assign(&f::augment(u, &state));
            }
        }

        Ok(Harvest {
            design,
            targets,
            state,
        })
    }

    /// Fit the readout on `series[..train_len + 1]`.
    pub fn train(
        self,
        series: &Array1<f64>,
        train_len: usize,
        init_len: usize,
    ) -> Result<TrainedEsn> {
        let Harvest {
            design,
            targets,
            state,
        } = self.harvest(series, train_len, init_len)?;

        let method = ReadoutMethod::from(self.config.regularization);
        let w_out = method.fit(&design, &targets)?;

        debug!(
            ?method,
            columns = design.ncols(),
            features = design.nrows(),
            "fitted readout"
        );

        Ok(TrainedEsn {
            esn: self,
            w_out,
            state,
            train_len,
        })
    }
}

/// Reservoir with a fitted readout and the state it ended training in.
#[derive(Debug, Clone)]
pub struct TrainedEsn {
    esn: Esn,
    w_out: Array2<f64>,
    state: Array1<f64>,
    train_len: usize,
}

impl TrainedEsn {
    /// Readout weights, shape `1 × (reservoir_size + 2)`.
    pub fn readout(&self) -> &Array2<f64> {
        &self.w_out
    }

    /// State carried over from the end of training.
    pub fn state(&self) -> &Array1<f64> {
        &self.state
    }

    pub fn train_len(&self) -> usize {
        self.train_len
    }

    pub fn output(&self, input: f64, state: &Array1<f64>) -> f64 {
        self.w_out.row(0).dot(&f::augment(input, state))
    }

    /// Continue from the carried-over state for `test_len` steps, starting
    /// from the sample right after the training segment.
    pub fn run(&self, series: &Array1<f64>, test_len: usize, mode: Mode) -> Result<Array1<f64>> {
        if test_len == 0 {
            return Err(Error::invalid_config("test_len must be at least 1"));
        }

        let required = match mode {
            Mode::Prediction => sum_lengths(self.train_len, test_len)?,
            Mode::Generative => sum_lengths(self.train_len, 1)?,
        };
        if series.len() < required {
            return Err(Error::insufficient_data(required, series.len()));
        }

        let mut state = self.state.clone();
        let mut input = series[self.train_len];
        let mut outputs = Array1::zeros(test_len);

        for t in 0..test_len {
            state = self.esn.step(&state, input);
            let y = self.output(input, &state);

            if !y.is_finite() {
                return Err(Error::NonFinite { step: t });
            }
            outputs[t] = y;

            input = match mode {
                Mode::Generative => y,
                Mode::Prediction if t + 1 < test_len => series[self.train_len + t + 1],
                Mode::Prediction => input,
            };
        }

        debug!(%mode, steps = test_len, "ran trained reservoir");
        Ok(outputs)
    }

    /// Ground truth the outputs are compared against.
    pub fn truth<'a>(&self, series: &'a Array1<f64>, len: usize) -> Result<ArrayView1<'a, f64>> {
        let start = sum_lengths(self.train_len, 1)?;
        let end = sum_lengths(start, len)?;
        if series.len() < end {
            return Err(Error::insufficient_data(end, series.len()));
        }

        Ok(series.slice(s![start..end]))
    }

    /// MSE over the first `error_len` outputs.
    pub fn score(
        &self,
        series: &Array1<f64>,
        outputs: &Array1<f64>,
        error_len: usize,
    ) -> Result<f64> {
        if error_len == 0 {
            return Err(Error::invalid_config("error_len must be at least 1"));
        }

        if error_len > outputs.len() {
            return Err(Error::invalid_config(format!(
                "error_len ({error_len}) exceeds the {} available outputs",
                outputs.len()
            )));
        }

        let truth = self.truth(series, error_len)?;
        Bench::mse(truth, outputs.slice(s![..error_len]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn small(seed: u64) -> EsnConfig {
        EsnConfig {
            reservoir_size: 40,
            seed: Some(seed),
            ..EsnConfig::default()
        }
    }

    fn wave(len: usize) -> Array1<f64> {
        Array1::from_shape_fn(len, |t| 0.5 * (t as f64 / 4.).sin() + 0.2 * (t as f64 / 9.).cos())
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("prediction".parse::<Mode>().unwrap(), Mode::Prediction);
        assert_eq!("Generative".parse::<Mode>().unwrap(), Mode::Generative);
        assert!(matches!("closed".parse::<Mode>(), Err(Error::UnknownMode(_))));
        assert_eq!(Mode::Generative.to_string(), "generative");
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            EsnConfig {
                reservoir_size: 0,
                ..small(1)
            },
            EsnConfig {
                leak_rate: 0.,
                ..small(1)
            },
            EsnConfig {
                leak_rate: 1.5,
                ..small(1)
            },
            EsnConfig {
                spectral_radius: f64::NAN,
                ..small(1)
            },
            EsnConfig {
                regularization: Some(-1.),
                ..small(1)
            },
        ];

        for config in bad {
            assert!(Esn::new(config).is_err());
        }
    }

    #[test]
    fn recurrent_matrix_has_target_spectral_radius() {
        for target in [0.3, 1.25] {
            let esn = Esn::new(EsnConfig {
                spectral_radius: target,
                ..small(3)
            })
            .unwrap();

            let rho = esn.spectral_radius().unwrap();
            assert!(((rho - target) / target).abs() < 1e-9, "{rho} vs {target}");
        }
    }

    #[test]
    fn weights_are_drawn_in_range() {
        let esn = Esn::new(EsnConfig {
            input_scaling: 2.,
            ..small(9)
        })
        .unwrap();

        assert_eq!(esn.w_in().dim(), (40, 2));
        assert_eq!(esn.w().dim(), (40, 40));
        assert!(esn.w_in().iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn seed_reproduces_weights() {
        let a = Esn::new(small(42)).unwrap();
        let b = Esn::new(small(42)).unwrap();
        let c = Esn::new(small(43)).unwrap();

        assert_eq!(a.seed(), Some(42));
        assert_eq!(a.w(), b.w());
        assert_eq!(a.w_in(), b.w_in());
        assert_ne!(a.w(), c.w());
    }

    #[test]
    fn injected_rng_is_used() {
        let a = Esn::with_rng(small(0), &mut StdRng::seed_from_u64(5)).unwrap();
        let b = Esn::with_rng(small(0), &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(a.seed(), None);
        assert_eq!(a.w(), b.w());
    }

    #[test]
    fn zero_projection_keeps_states_at_zero() {
        let esn = Esn::new(EsnConfig {
            input_scaling: 0.,
            ..small(4)
        })
        .unwrap();
        let h = esn.harvest(&Array1::zeros(301), 300, 50).unwrap();

        assert_eq!(h.design.dim(), (42, 250));
        assert!(h.design.row(0).iter().all(|&v| v == 1.));
        assert!(h.design.slice(s![1.., ..]).iter().all(|&v| v == 0.));
    }

    #[test]
    fn zero_input_settles_to_fixed_point() {
        let esn = Esn::new(EsnConfig {
            reservoir_size: 20,
            spectral_radius: 0.3,
            leak_rate: 1.,
            seed: Some(8),
            ..EsnConfig::default()
        })
        .unwrap();

        let series = Array1::zeros(700);
        let h = esn.harvest(&series, 600, 100).unwrap();
        let last = h.design.column(h.design.ncols() - 1);
        let prev = h.design.column(h.design.ncols() - 2);
        assert!((&last - &prev).mapv(f64::abs).sum() < 1e-10);

        let trained = esn.train(&series, 600, 100).unwrap();
        let out = trained.run(&series, 50, Mode::Prediction).unwrap();
        let spread = out.fold(f64::NEG_INFINITY, |m, &v| m.max(v))
            - out.fold(f64::INFINITY, |m, &v| m.min(v));
        assert!(spread < 1e-9);
    }

    #[test]
    fn modes_agree_on_first_step_only_by_construction() {
        let series = wave(600);
        let trained = Esn::new(small(21)).unwrap().train(&series, 400, 50).unwrap();

        let predicted = trained.run(&series, 100, Mode::Prediction).unwrap();
        let generated = trained.run(&series, 20, Mode::Generative).unwrap();

        assert_eq!(predicted[0].to_bits(), generated[0].to_bits());
        assert!(generated.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn running_does_not_consume_the_carried_state() {
        let series = wave(500);
        let trained = Esn::new(small(2)).unwrap().train(&series, 300, 30).unwrap();
        let before = trained.state().clone();

        let a = trained.run(&series, 50, Mode::Prediction).unwrap();
        let b = trained.run(&series, 50, Mode::Prediction).unwrap();

        assert_eq!(a, b);
        assert_eq!(trained.state(), &before);
    }

    #[test]
    fn pseudo_inverse_readout_tracks_a_smooth_signal() {
        let series = wave(1_000);
        let trained = Esn::new(EsnConfig {
            regularization: None,
            spectral_radius: 0.9,
            ..small(13)
        })
        .unwrap()
        .train(&series, 700, 50)
        .unwrap();

        assert_eq!(trained.readout().dim(), (1, 42));

        let out = trained.run(&series, 200, Mode::Prediction).unwrap();
        assert!(trained.score(&series, &out, 200).unwrap() < 1e-3);
    }

    #[test]
    fn training_needs_the_next_sample() {
        let esn = Esn::new(small(1)).unwrap();
        assert!(matches!(
            esn.harvest(&wave(300), 300, 10),
            Err(Error::InsufficientData {
                required: 301,
                actual: 300
            })
        ));
        assert!(esn.harvest(&wave(300), 10, 10).is_err());
        assert!(matches!(
            esn.harvest(&wave(300), usize::MAX, 10),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn prediction_needs_the_continuation() {
        let series = wave(350);
        let trained = Esn::new(small(6)).unwrap().train(&series, 300, 20).unwrap();

        assert!(trained.run(&series, 51, Mode::Prediction).is_err());
        assert!(trained.run(&series, 50, Mode::Prediction).is_ok());
        assert!(trained.run(&series, 60, Mode::Generative).is_ok());
        assert!(trained.run(&series, 0, Mode::Generative).is_err());
        assert!(matches!(
            trained.run(&series, usize::MAX, Mode::Prediction),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn score_fails_past_available_truth() {
        let series = wave(400);
        let trained = Esn::new(small(5)).unwrap().train(&series, 300, 20).unwrap();
        let out = trained.run(&series, 100, Mode::Prediction).unwrap();

        // only 99 samples follow the one the first output predicts
        assert!(trained.score(&series, &out, 99).is_ok());
        assert!(matches!(
            trained.score(&series, &out, 100),
            Err(Error::InsufficientData { .. })
        ));
        assert!(matches!(
            trained.score(&series, &out, 101),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(trained.score(&series, &out, 0).is_err());
        assert_eq!(trained.train_len(), 300);
        assert!(matches!(
            trained.truth(&series, usize::MAX),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
