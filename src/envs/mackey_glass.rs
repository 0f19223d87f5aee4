use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    f,
};

/// Forward-Euler discretization of the Mackey-Glass delay equation
///
/// dy/dt = alpha * y(t - tau) / (1 + y(t - tau)^beta) - gamma * y(t)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MackeyGlass {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Integration step, also the sampling interval of the output.
    pub delta: f64,
    /// Delay in time units, converted to steps by `lag`.
    pub tau: f64,
    /// Value of sample 0, and of every lookback before history exists.
    pub init: f64,
    /// Number of samples to produce.
    pub horizon: usize,
}

impl Default for MackeyGlass {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 10.,
            gamma: 0.1,
            delta: 0.1,
            tau: 17.,
            init: 1.2,
            horizon: 10_000,
        }
    }
}

impl MackeyGlass {
    pub fn validate(&self) -> Result<()> {
        let params = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("delta", self.delta),
            ("tau", self.tau),
            ("init", self.init),
        ];

        if let Some((name, _)) = params.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::invalid_config(format!("{name} must be finite")));
        }

        if self.delta <= 0. {
            return Err(Error::invalid_config(format!(
                "delta must be positive, got {}",
                self.delta
            )));
        }

        if self.horizon == 0 {
            return Err(Error::invalid_config("horizon must be at least 1 sample"));
        }

        if (self.tau / self.delta).floor() < 1. {
            return Err(Error::invalid_config(format!(
                "tau/delta = {} gives a negative delay in steps",
                self.tau / self.delta
            )));
        }

        Ok(())
    }

    /// Delay in steps, `floor(tau/delta) - 1`.
    pub fn lag(&self) -> Result<usize> {
        self.validate()?;
        Ok(((self.tau / self.delta).floor() - 1.) as usize)
    }

    fn derivative(&self, step: usize, current: f64, lagged: f64) -> Result<f64> {
        if lagged < 0. && self.beta.fract() != 0. {
            return Err(Error::Domain {
                step,
                base: lagged,
                exponent: self.beta,
            });
        }

        Ok(self.alpha * lagged / (1. + lagged.powf(self.beta)) - self.gamma * current)
    }

    pub fn generate(&self) -> Result<Trajectory> {
        // lag 0 would read the sample being written, use the previous one instead
        let lookback = self.lag()?.max(1);

        let mut ys = Vec::with_capacity(self.horizon);
        ys.push(self.init);

        for n in 1..self.horizon {
            let current = ys[n - 1];
            let lagged = match n.checked_sub(lookback) {
                Some(i) => ys[i],
                None => self.init,
            };

            let y = current + self.delta * self.derivative(n, current, lagged)?;
            if !y.is_finite() {
                return Err(Error::NonFinite { step: n });
            }

            ys.push(y);
        }

        Ok(Trajectory {
            raw: Array1::from_vec(ys),
        })
    }

    /// Parameter-encoded file name suffix.
    pub fn file_suffix(&self) -> String {
        format!(
            "_t{}_alpha{}_beta{}_gamma{}_delta{}_init_{}_tau{}",
            self.horizon, self.alpha, self.beta, self.gamma, self.delta, self.init, self.tau
        )
    }
}

/// Output of `MackeyGlass::generate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    raw: Array1<f64>,
}

impl Trajectory {
    /// Integrated values, before any squashing.
    pub fn raw(&self) -> &Array1<f64> {
        &self.raw
    }

    /// `tanh` of the raw values, the form written by the generator binary.
    pub fn saturated(&self) -> Array1<f64> {
        f::tanh(&self.raw)
    }

    /// Every `stride`-th sample after dropping the first `skip`.
    pub fn downsample(&self, skip: usize, stride: usize) -> Trajectory {
        let raw = self
            .raw
            .iter()
            .skip(skip)
            .step_by(stride.max(1))
            .copied()
            .collect::<Array1<f64>>();

        Trajectory { raw }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
