use std::path::Path;

use plotly::{Plot, Scatter, common::Mode as LineMode};

use crate::nn::esn::Mode;

fn render(plot: Plot, out: Option<&Path>) {
    match out {
        Some(path) => plot.write_html(path),
        None => plot.show(),
    }
}

/// Line plot of a single series against its sample index.
pub fn plot_series(series: &[f64], name: &str, out: Option<&Path>) {
    let mut plot = Plot::new();
    let x = (0..series.len()).collect::<Vec<usize>>();
    plot.add_trace(
        Scatter::new(x, series.to_vec())
            .mode(LineMode::Lines)
            .name(name),
    );
    render(plot, out);
}

/// Target signal against the reservoir's outputs.
pub fn plot_signals(target: &[f64], predicted: &[f64], mode: Mode, out: Option<&Path>) {
    let mut plot = Plot::new();

    let predicted_name = match mode {
        Mode::Prediction => "Predicted signal",
        Mode::Generative => "Free-running predicted signal",
    };

    for (y, name) in [(target, "Target signal"), (predicted, predicted_name)] {
        let x = (0..y.len()).collect::<Vec<usize>>();
        plot.add_trace(Scatter::new(x, y.to_vec()).mode(LineMode::Lines).name(name));
    }

    render(plot, out);
}
