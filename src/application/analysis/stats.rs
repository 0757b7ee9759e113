//! Small statistics helpers shared by the KPI and goal layers

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`)
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (divisor `n - 1`); NaN below two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Median; the two middle values average out for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Apply `f` to every full rolling window of `values`
///
/// Yields `len - window + 1` results; shorter inputs yield nothing.
pub fn rolling_map(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values.windows(window).map(|w| f(w)).collect()
}
