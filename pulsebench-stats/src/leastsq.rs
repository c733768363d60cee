//! Least-Squares Curve Fitting
//!
//! Fits per-iteration timings against a scaled complexity curve
//! `time ≈ coef * curve(n)` and reports the normalized root-mean-square
//! deviation of the fit. The curve itself is supplied by the caller, so this
//! module stays independent of the engine's complexity enum.

/// Result of fitting timings against a single complexity curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSq {
    /// Scaling coefficient minimizing the squared error.
    pub coef: f64,
    /// Root-mean-square deviation of the fit, normalized by the mean time.
    pub rms: f64,
}

/// Minimal least-squares fit of `time[i] ≈ coef * curve(n[i])`.
///
/// `n` and `time` must have the same, nonzero length. The coefficient is the
/// closed-form minimizer `Σ(t·g) / Σ(g²)`; the rms is reported relative to
/// the mean observed time so fits at different magnitudes are comparable.
pub fn least_sq(n: &[i64], time: &[f64], curve: impl Fn(i64) -> f64) -> LeastSq {
    assert_eq!(n.len(), time.len());
    assert!(!n.is_empty(), "least_sq requires at least one data point");

    let mut sigma_gn_squared = 0.0;
    let mut sigma_time = 0.0;
    let mut sigma_time_gn = 0.0;
    for (&ni, &ti) in n.iter().zip(time.iter()) {
        let gn = curve(ni);
        sigma_gn_squared += gn * gn;
        sigma_time += ti;
        sigma_time_gn += ti * gn;
    }

    let coef = sigma_time_gn / sigma_gn_squared;

    let mut rms = 0.0;
    for (&ni, &ti) in n.iter().zip(time.iter()) {
        let fit = coef * curve(ni);
        rms += (ti - fit) * (ti - fit);
    }
    let mean = sigma_time / n.len() as f64;

    LeastSq {
        coef,
        rms: (rms / n.len() as f64).sqrt() / mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_linear_fit() {
        let n = [1_i64, 10, 100, 1000];
        let time: Vec<f64> = n.iter().map(|&x| 3.5 * x as f64).collect();
        let fit = least_sq(&n, &time, |x| x as f64);

        assert!((fit.coef - 3.5).abs() < 1e-9);
        assert!(fit.rms < 1e-9);
    }

    #[test]
    fn exact_quadratic_fit() {
        let n = [2_i64, 4, 8, 16];
        let time: Vec<f64> = n.iter().map(|&x| 0.25 * (x * x) as f64).collect();
        let fit = least_sq(&n, &time, |x| (x * x) as f64);

        assert!((fit.coef - 0.25).abs() < 1e-9);
        assert!(fit.rms < 1e-9);
    }

    #[test]
    fn noisy_fit_reports_rms() {
        let n = [1_i64, 2, 3, 4];
        // Linear with a bump on the last point.
        let time = [1.0, 2.0, 3.0, 5.0];
        let fit = least_sq(&n, &time, |x| x as f64);

        assert!(fit.coef > 1.0);
        assert!(fit.rms > 0.0);
    }

    #[test]
    #[should_panic]
    fn empty_input_panics() {
        least_sq(&[], &[], |x| x as f64);
    }
}
