//! Generate a Mackey-Glass series.
//!
//! ```bash
//! cargo run --bin mackey-glass -- 10000 --tau 17 --output data/mackey
//! ```
//!
//! The saturated (`tanh`) series is written one value per line. Unless
//! `--rmparams` is given the parameters are appended to the file name, e.g.
//! `data/mackey_t10000_alpha0.2_beta10_gamma0.1_delta0.1_init_1.2_tau17`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use mackey_esn::{
    envs::mackey_glass::MackeyGlass,
    util::{graph, io},
};

#[derive(Parser, Debug)]
#[command(name = "mackey-glass")]
#[command(about = "Generate data following the Mackey-Glass delay equation")]
struct Args {
    /// Number of time samples.
    #[arg(default_value_t = 10_000)]
    time: usize,

    #[arg(long, default_value_t = 0.2)]
    alpha: f64,

    #[arg(long, default_value_t = 10.0)]
    beta: f64,

    #[arg(long, default_value_t = 0.1)]
    gamma: f64,

    /// Integration step (sampling constant).
    #[arg(long, default_value_t = 0.1)]
    delta: f64,

    #[arg(long, default_value_t = 17.0)]
    tau: f64,

    /// Initial value of the series.
    #[arg(long, default_value_t = 1.2)]
    init: f64,

    /// File the series is saved to; nothing is saved when absent.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not append the parameters to the output file name.
    #[arg(long)]
    rmparams: bool,

    /// Plot the saturated series.
    #[arg(short = 'p')]
    plot: bool,

    /// Write the plot to an HTML file instead of opening a browser.
    #[arg(long, requires = "plot")]
    plot_file: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
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

    let params = MackeyGlass {
        alpha: args.alpha,
        beta: args.beta,
        gamma: args.gamma,
        delta: args.delta,
        tau: args.tau,
        init: args.init,
        horizon: args.time,
    };

    let trajectory = params.generate()?;
    let saturated = trajectory.saturated();
    info!(samples = trajectory.len(), lag = params.lag()?, "generated series");

    if let Some(output) = args.output {
        let path = if args.rmparams {
            output
        } else {
            let mut name = output.into_os_string();
            name.push(params.file_suffix());
            PathBuf::from(name)
        };

        io::save_series(&path, &saturated)?;
        info!(path = %path.display(), "saved series");
    }

    if args.plot {
        graph::plot_series(&saturated.to_vec(), "Mackey-Glass", args.plot_file.as_deref());
    }

    Ok(())
}
