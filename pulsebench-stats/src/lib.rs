#![warn(missing_docs)]
//! PulseBench Stats - Numeric Routines
//!
//! Pure numeric building blocks shared by the engine and the reporters:
//! - Summary reducers over `&[f64]` (mean, median, standard deviation, CV)
//! - Least-squares fitting of timing data against a complexity curve
//!
//! Everything here operates on plain slices so it can be unit-tested without
//! touching the execution machinery.

mod leastsq;
mod reducers;

pub use leastsq::{least_sq, LeastSq};
pub use reducers::{coefficient_of_variation, mean, median, stdev};
