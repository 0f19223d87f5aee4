//! Echo state network demo on a Mackey-Glass series.
//!
//! ```bash
//! # generated series, default parameters
//! cargo run --release --bin minimal-esn
//!
//! # series from a file, free running, pseudo-inverse readout
//! cargo run --release --bin minimal-esn -- \
//!     --data MackeyGlass_t17.txt --mode generative --pinv --plot esn.html
//! ```
//!
//! Reservoir performance should be averaged over many seeds with the same
//! parameters; the seed is printed so a single run can be replayed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::{Array1, s};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use mackey_esn::{
    envs::mackey_glass::MackeyGlass,
    experiment::{self, ExperimentConfig},
    nn::esn::Mode,
    util::{bench::Bench, graph, io},
};

/// Integration steps per sample of a generated series.
const STRIDE: usize = 10;
/// Generated samples dropped before the series starts.
const TRANSIENT: usize = 1_000;

#[derive(Parser, Debug)]
#[command(name = "minimal-esn")]
#[command(about = "Train an echo state network to predict a Mackey-Glass series")]
struct Args {
    /// Whitespace-delimited series; a Mackey-Glass series is generated when absent.
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON experiment config. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `prediction` or `generative`.
    #[arg(long)]
    mode: Option<Mode>,

    #[arg(long)]
    reservoir_size: Option<usize>,

    #[arg(long)]
    leak_rate: Option<f64>,

    #[arg(long)]
    spectral_radius: Option<f64>,

    #[arg(long)]
    input_scaling: Option<f64>,

    /// Ridge regularization coefficient.
    #[arg(long, conflicts_with = "pinv")]
    reg: Option<f64>,

    /// Fit the readout with the pseudo-inverse instead of ridge regression.
    #[arg(long)]
    pinv: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    train_len: Option<usize>,

    #[arg(long)]
    test_len: Option<usize>,

    #[arg(long)]
    init_len: Option<usize>,

    #[arg(long)]
    error_len: Option<usize>,

    /// Write target vs. output to an HTML file.
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Open the target vs. output plot in a browser.
    #[arg(long)]
    show: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn experiment(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(v) = self.reservoir_size {
            config.esn.reservoir_size = v;
        }
        if let Some(v) = self.leak_rate {
            config.esn.leak_rate = v;
        }
        if let Some(v) = self.spectral_radius {
            config.esn.spectral_radius = v;
        }
        if let Some(v) = self.input_scaling {
            config.esn.input_scaling = v;
        }
        if self.pinv {
            config.esn.regularization = None;
        } else if let Some(v) = self.reg {
            config.esn.regularization = Some(v);
        }
        if self.seed.is_some() {
            config.esn.seed = self.seed;
        }
        if let Some(v) = self.train_len {
            config.train_len = v;
        }
        if let Some(v) = self.test_len {
            config.test_len = v;
        }
        if let Some(v) = self.init_len {
            config.init_len = v;
        }
        if let Some(v) = self.error_len {
            config.error_len = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn generated_series(len: usize) -> Result<Array1<f64>> {
    let horizon = len
        .checked_add(TRANSIENT)
        .and_then(|n| n.checked_mul(STRIDE))
        .context("series too long to generate")?;
    let params = MackeyGlass {
        horizon,
        ..MackeyGlass::default()
    };

    let series = params
        .generate()?
        .downsample(TRANSIENT * STRIDE, STRIDE)
        .saturated();
    Ok(series)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.experiment()?;

    let series = match &args.data {
        Some(path) => {
            io::load_series(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => generated_series(config.required_len()?)?,
    };
    info!(samples = series.len(), mode = %config.mode, "loaded data");

    let outcome = experiment::run(&config, &series)?;

    let start = config.train_len + 1;
    let shown = config.test_len.min(series.len() - start);
    let target = series.slice(s![start..start + shown]);
    let outputs = outcome.outputs.slice(s![..shown]);
    Bench::score(target, outputs)?;

    match outcome.seed {
        Some(seed) => println!("Seed used for random values: {seed}"),
        None => println!("Seed used for random values: none (unseeded)"),
    }
    println!("MSE = {}", outcome.mse);

    if args.plot.is_some() || args.show {
        graph::plot_signals(
            &target.to_vec(),
            &outputs.to_vec(),
            config.mode,
            args.plot.as_deref(),
        );
    }

    Ok(())
}
