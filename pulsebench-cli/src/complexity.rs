//! Complexity-Fit Records
//!
//! When the last instance of a family finishes, its accumulated records are
//! fitted against the family's complexity curve, yielding two aggregate
//! records: the fitted coefficients and the normalized rms of the fit.

use pulsebench_core::{Complexity, ComplexityFn};
use pulsebench_report::Run;
use pulsebench_stats::least_sq;

fn factorial(n: i64) -> f64 {
    (1..=n).fold(1.0, |acc, i| acc * i as f64)
}

fn fitting_curve(complexity: Complexity, lambda: Option<ComplexityFn>) -> Box<dyn Fn(i64) -> f64> {
    match complexity {
        Complexity::N => Box::new(|n| n as f64),
        Complexity::NSquared => Box::new(|n| (n as f64).powi(2)),
        Complexity::NCubed => Box::new(|n| (n as f64).powi(3)),
        Complexity::LogN => Box::new(|n| (n as f64).log2()),
        Complexity::NLogN => Box::new(|n| n as f64 * (n as f64).log2()),
        Complexity::TwoPowN => Box::new(|n| (n as f64).exp2()),
        Complexity::Factorial => Box::new(factorial),
        Complexity::Lambda => {
            let f = lambda.expect("Lambda complexity requires a fitting curve");
            Box::new(move |n| f(n))
        }
        Complexity::None | Complexity::O1 => Box::new(|_| 1.0),
    }
}

/// Fit a family's per-iteration times against its complexity curve.
///
/// Returns nothing for fewer than two data points. Otherwise emits a
/// `<family>_BigO` record carrying the real/CPU coefficients and a
/// `<family>_RMS` record carrying the normalized deviations; both have an
/// iteration count of zero so reporters skip the per-iteration division.
pub fn compute_big_o(reports: &[Run]) -> Vec<Run> {
    if reports.len() < 2 {
        return Vec::new();
    }

    let mut n = Vec::with_capacity(reports.len());
    let mut real_time = Vec::with_capacity(reports.len());
    let mut cpu_time = Vec::with_capacity(reports.len());
    for run in reports {
        n.push(run.complexity_n);
        real_time.push(run.real_accumulated_time / run.iterations as f64);
        cpu_time.push(run.cpu_accumulated_time / run.iterations as f64);
    }

    let curve = fitting_curve(reports[0].complexity, reports[0].complexity_lambda);
    let result_cpu = least_sq(&n, &cpu_time, &curve);
    let result_real = least_sq(&n, &real_time, &curve);

    // Arguments are dropped from the family name.
    let family = reports[0]
        .benchmark_name
        .split('/')
        .next()
        .unwrap_or(&reports[0].benchmark_name)
        .to_string();

    let big_o = Run {
        benchmark_name: format!("{family}_BigO"),
        report_label: reports[0].report_label.clone(),
        iterations: 0,
        time_unit: reports[0].time_unit,
        real_accumulated_time: result_real.coef,
        cpu_accumulated_time: result_cpu.coef,
        report_big_o: true,
        complexity: reports[0].complexity,
        ..Run::default()
    };

    // RMS is a relative quantity; pre-divide by the unit multiplier so the
    // reporters' scaling restores the raw ratio.
    let multiplier = reports[0].time_unit.multiplier();
    let rms = Run {
        benchmark_name: format!("{family}_RMS"),
        report_label: reports[0].report_label.clone(),
        iterations: 0,
        time_unit: reports[0].time_unit,
        real_accumulated_time: result_real.rms / multiplier,
        cpu_accumulated_time: result_cpu.rms / multiplier,
        report_rms: true,
        complexity: reports[0].complexity,
        ..Run::default()
    };

    vec![big_o, rms]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebench_core::TimeUnit;

    fn family_run(name: &str, n: i64, seconds_per_iter: f64, complexity: Complexity) -> Run {
        Run {
            benchmark_name: name.to_string(),
            iterations: 10,
            complexity_n: n,
            real_accumulated_time: seconds_per_iter * 10.0,
            cpu_accumulated_time: seconds_per_iter * 10.0,
            complexity,
            time_unit: TimeUnit::Nanosecond,
            ..Run::default()
        }
    }

    #[test]
    fn too_few_points_yield_nothing() {
        assert!(compute_big_o(&[]).is_empty());
        assert!(compute_big_o(&[family_run("bm/1", 1, 1.0, Complexity::N)]).is_empty());
    }

    #[test]
    fn linear_family_fits_its_coefficient() {
        let reports: Vec<Run> = [1_i64, 10, 100, 1000]
            .iter()
            .map(|&n| family_run(&format!("bm_lin/{n}"), n, 2e-9 * n as f64, Complexity::N))
            .collect();

        let records = compute_big_o(&reports);
        assert_eq!(records.len(), 2);

        let big_o = &records[0];
        assert_eq!(big_o.benchmark_name, "bm_lin_BigO");
        assert!(big_o.report_big_o);
        assert_eq!(big_o.iterations, 0);
        assert!((big_o.cpu_accumulated_time - 2e-9).abs() < 1e-15);

        let rms = &records[1];
        assert_eq!(rms.benchmark_name, "bm_lin_RMS");
        assert!(rms.report_rms);
        assert!(rms.cpu_accumulated_time.abs() < 1e-12, "perfect fit has ~0 rms");
    }

    #[test]
    fn lambda_curve_is_honored() {
        fn curve(n: i64) -> f64 {
            (n * n) as f64
        }

        let mut reports: Vec<Run> = [2_i64, 4, 8, 16]
            .iter()
            .map(|&n| {
                family_run(
                    &format!("bm_sq/{n}"),
                    n,
                    0.5e-9 * (n * n) as f64,
                    Complexity::Lambda,
                )
            })
            .collect();
        for r in &mut reports {
            r.complexity_lambda = Some(curve);
        }

        let records = compute_big_o(&reports);
        assert!((records[0].cpu_accumulated_time - 0.5e-9).abs() < 1e-15);
    }

    #[test]
    fn exotic_curves_are_monotone() {
        let two_pow = fitting_curve(Complexity::TwoPowN, None);
        assert_eq!(two_pow(3), 8.0);

        let fact = fitting_curve(Complexity::Factorial, None);
        assert_eq!(fact(4), 24.0);
        assert_eq!(fact(0), 1.0);

        let nlogn = fitting_curve(Complexity::NLogN, None);
        assert_eq!(nlogn(8), 24.0);
    }
}
