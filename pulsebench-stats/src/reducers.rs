//! Summary Reducers
//!
//! The default per-repetition aggregates (mean, median, stddev) plus the
//! coefficient of variation, all usable as user-registered statistics.

/// Arithmetic mean. Returns 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of the values (midpoint of the two central elements for an even
/// count). Returns 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Sample standard deviation, computed from the mean of squares so a single
/// pass over the data suffices. Returns 0 for fewer than two values.
pub fn stdev(values: &[f64]) -> f64 {
    let m = mean(values);
    if values.len() < 2 {
        return 0.0;
    }
    let avg_squares = values.iter().map(|x| x * x).sum::<f64>() / values.len() as f64;
    let n = values.len() as f64;
    (n / (n - 1.0) * (avg_squares - m * m)).max(0.0).sqrt()
}

/// Coefficient of variation: stddev relative to the mean. Returns 0 when the
/// mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    stdev(values) / m
}
