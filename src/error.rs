//! Error types shared by the generator, the reservoir and the I/O helpers.

use thiserror::Error;

/// Errors raised while configuring, running or scoring a model.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter record failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },

    /// A series is too short for the requested segment.
    #[error("insufficient data: required {required} samples, actual {actual}")]
    InsufficientData {
        /// Samples the operation needs
        required: usize,
        /// Samples available
        actual: usize,
    },

    /// Mode string was neither `prediction` nor `generative`.
    #[error("unrecognized mode `{0}`, expected `prediction` or `generative`")]
    UnknownMode(String),

    /// Negative base raised to a non-integer exponent.
    #[error("domain error at step {step}: {base}^{exponent} is undefined")]
    Domain {
        /// Time step being computed
        step: usize,
        /// Offending base
        base: f64,
        /// Exponent applied to it
        exponent: f64,
    },

    /// A recursion produced NaN or infinity.
    #[error("non-finite value at step {step}")]
    NonFinite {
        /// Time step that produced the value
        step: usize,
    },

    /// A decomposition or solve did not succeed.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// Malformed series file.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an InsufficientData error.
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// `a + b` for segment bounds, failing instead of wrapping.
pub(crate) fn sum_lengths(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b)
        .ok_or_else(|| Error::invalid_config(format!("segment length {a} + {b} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = Error::insufficient_data(2001, 1500);
        assert_eq!(
            e.to_string(),
            "insufficient data: required 2001 samples, actual 1500"
        );

        let e = Error::invalid_config("delta must be positive");
        assert!(e.to_string().contains("delta must be positive"));

        let e = Error::UnknownMode("closed".into());
        assert!(e.to_string().contains("`closed`"));
    }

    #[test]
    fn length_sums_do_not_wrap() {
        assert_eq!(sum_lengths(2000, 1).unwrap(), 2001);
        assert!(matches!(
            sum_lengths(usize::MAX, 1),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
