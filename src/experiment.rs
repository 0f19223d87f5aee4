use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::{
    error::{Error, Result, sum_lengths},
    nn::esn::{Esn, EsnConfig, Mode},
};

/// One train-run-score pass over a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub esn: EsnConfig,
    /// Samples driven through the reservoir while collecting states
    pub train_len: usize,
    /// Steps run after training
    pub test_len: usize,
    /// Warm-up steps excluded from the design matrix
    pub init_len: usize,
    /// Outputs included in the MSE
    pub error_len: usize,
    pub mode: Mode,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            esn: EsnConfig::default(),
            train_len: 2000,
            test_len: 2000,
            init_len: 100,
            error_len: 2000,
            mode: Mode::Prediction,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.esn.validate()?;

        if self.init_len >= self.train_len {
            return Err(Error::invalid_config(format!(
                "init_len ({}) must be smaller than train_len ({})",
                self.init_len, self.train_len
            )));
        }

        if self.test_len == 0 || self.error_len == 0 {
            return Err(Error::invalid_config(
                "test_len and error_len must be at least 1",
            ));
        }

        if self.error_len > self.test_len {
            return Err(Error::invalid_config(format!(
                "error_len ({}) exceeds test_len ({})",
                self.error_len, self.test_len
            )));
        }

        Ok(())
    }

    /// Samples a series needs for this configuration to run and be scored.
    pub fn required_len(&self) -> Result<usize> {
        let run = match self.mode {
            Mode::Prediction => sum_lengths(self.train_len, self.test_len)?,
            Mode::Generative => sum_lengths(self.train_len, 1)?,
        };
        let scored = sum_lengths(sum_lengths(self.train_len, 1)?, self.error_len)?;
        Ok(run.max(scored))
    }
}

/// Everything an experiment produces.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Seed the weights were drawn with, `None` if not replayable
    pub seed: Option<u64>,
    pub readout: Array2<f64>,
    pub outputs: Array1<f64>,
    pub mse: f64,
}

pub fn run(config: &ExperimentConfig, series: &Array1<f64>) -> Result<Outcome> {
    config.validate()?;

    // checked up front so a short series fails before the eigen solve
    let required = config.required_len()?;
    if series.len() < required {
        return Err(Error::insufficient_data(required, series.len()));
    }

    let _span = info_span!("experiment", mode = %config.mode).entered();

    let esn = Esn::new(config.esn.clone())?;
    let seed = esn.seed();

    let trained = esn.train(series, config.train_len, config.init_len)?;
    let outputs = trained.run(series, config.test_len, config.mode)?;
    let mse = trained.score(series, &outputs, config.error_len)?;

    info!(?seed, mse, "experiment finished");

    Ok(Outcome {
        seed,
        readout: trained.readout().clone(),
        outputs,
        mse,
    })
}
