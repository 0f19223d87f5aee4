use ndarray::{Array1, ArrayView1};
use ndarray_stats::QuantileExt;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub mse: f64,
    pub rmse: f64,
    pub nmse: f64,
    pub r2: f64,
    pub pearson_r: f64,
    pub max_abs_error: f64,
}

pub struct Bench {}

impl Bench {
    fn check(y_true: &ArrayView1<f64>, y_pred: &ArrayView1<f64>) -> Result<()> {
        if y_true.len() != y_pred.len() {
            return Err(Error::invalid_config(format!(
                "cannot compare {} targets with {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        if y_true.is_empty() {
            return Err(Error::insufficient_data(1, 0));
        }

        Ok(())
    }

    pub fn mse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Bench::check(&y_true, &y_pred)?;
        let sq = (&y_true - &y_pred).mapv(|v| v.powi(2));
        Ok(sq.sum() / sq.len() as f64)
    }

    /// MSE normalized by the variance of the targets.
    pub fn nmse(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        let mse_val = Bench::mse(y_true, y_pred)?;
        let var_y = variance(&y_true);
        Ok(mse_val / var_y)
    }

    pub fn r2(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Ok(1.0 - Bench::nmse(y_true, y_pred)?)
    }

    pub fn pearson_r(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<f64> {
        Bench::check(&y_true, &y_pred)?;
        let n = y_true.len() as f64;
        let y_true_centered = &y_true - y_true.sum() / n;
        let y_pred_centered = &y_pred - y_pred.sum() / n;
        let numerator = (&y_true_centered * &y_pred_centered).sum() / n;
        let denom = (y_true_centered.mapv(|v| v.powi(2)).sum() / n
            * y_pred_centered.mapv(|v| v.powi(2)).sum() / n)
            .sqrt();
        Ok(numerator / denom)
    }

    pub fn score(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Result<Score> {
        let mse = Bench::mse(y_true, y_pred)?;
        let abs_err: Array1<f64> = (&y_true - &y_pred).mapv(f64::abs);
        let max_abs_error = *abs_err
            .max()
            .map_err(|e| Error::Numerical(format!("max abs error: {e}")))?;

        let score = Score {
            mse,
            rmse: mse.sqrt(),
            nmse: Bench::nmse(y_true, y_pred)?,
            r2: Bench::r2(y_true, y_pred)?,
            pearson_r: Bench::pearson_r(y_true, y_pred)?,
            max_abs_error,
        };

        info!(
            mse = score.mse,
            rmse = score.rmse,
            nmse = score.nmse,
            r2 = score.r2,
            r = score.pearson_r,
            max_abs_error = score.max_abs_error,
            "bench metrics"
        );

        Ok(score)
    }
}

fn variance(y: &ArrayView1<f64>) -> f64 {
    let n = y.len() as f64;
    let mean = y.sum() / n;
    y.mapv(|v| (v - mean).powi(2)).sum() / n
}
