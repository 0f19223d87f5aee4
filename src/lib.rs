//! Mackey-Glass series generation and echo state network prediction.
//!
//! [`envs::mackey_glass`] integrates the delay equation, [`nn::esn`] drives a
//! random leaky reservoir over a series and fits a linear readout, and
//! [`experiment`] chains training, inference and scoring from one config.

pub mod envs;
pub mod error;
pub mod experiment;
pub mod f;
pub mod linalg;
pub mod nn;
pub mod optim;
pub mod util;

pub use error::{Error, Result};
