use ndarray::{Array1, s};

pub fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| v.tanh())
}

/// Bias, input and reservoir state stacked as `[1; u; x]`.
pub fn augment(input: f64, state: &Array1<f64>) -> Array1<f64> {
    let mut v = Array1::zeros(state.len() + 2);
    v[0] = 1.;
    v[1] = input;
    v.slice_mut(s![2..]).assign(state);
    v
}
