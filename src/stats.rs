//! Descriptive statistics over a per-sample metric series.

use std::fmt;

use serde::Serialize;

/// Summary of a numeric series: the usual describe() block.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending and non-empty; `q` in [0, 1].
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 >= n {
        return sorted[n - 1];
    }
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

/// Compute summary statistics. `None` for an empty series.
pub fn describe(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Some(SummaryStats {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count  {}", self.count)?;
        writeln!(f, "mean   {:.6}", self.mean)?;
        writeln!(f, "std    {:.6}", self.std)?;
        writeln!(f, "min    {:.6}", self.min)?;
        writeln!(f, "25%    {:.6}", self.q25)?;
        writeln!(f, "50%    {:.6}", self.median)?;
        writeln!(f, "75%    {:.6}", self.q75)?;
        write!(f, "max    {:.6}", self.max)
    }
}
