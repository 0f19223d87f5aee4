use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use ndarray::Array1;
use tracing::debug;

use crate::error::{Error, Result};

/// Read whitespace-delimited scalars, ignoring anything after `#`.
pub fn load_series(path: impl AsRef<Path>) -> Result<Array1<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let series = parse_series(&text)?;

    debug!(path = %path.display(), samples = series.len(), "loaded series");
    Ok(series)
}

pub fn parse_series(text: &str) -> Result<Array1<f64>> {
    let mut values = vec![];

    for (i, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();

        for token in content.split_whitespace() {
            let v: f64 = token.parse().map_err(|_| Error::Parse {
                line: i + 1,
                message: format!("`{token}` is not a number"),
            })?;

            if !v.is_finite() {
                return Err(Error::Parse {
                    line: i + 1,
                    message: format!("`{token}` is not finite"),
                });
            }

            values.push(v);
        }
    }

    Ok(Array1::from_vec(values))
}

/// One value per line, printed with enough digits to read back exactly.
pub fn save_series(path: impl AsRef<Path>, series: &Array1<f64>) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);

    for v in series.iter() {
        writeln!(out, "{v:e}")?;
    }
    out.flush()?;

    debug!(path = %path.display(), samples = series.len(), "saved series");
    Ok(())
}
