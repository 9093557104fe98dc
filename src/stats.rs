//! Statistical utility functions shared across modules
//!
//! Contains the compensated accumulator used by the correlation engine, the
//! mean/standard deviation used to standardize cluster scores, and the
//! running mean used to aggregate AUSR values across runs.

use std::ops::AddAssign;

/// Compensated (Neumaier) running sum.
///
/// Carries the low-order bits lost by each addition in a second term, which
/// keeps the error of a long accumulation independent of its length. This is
/// what the correlation engine uses in place of an extended precision float.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn new(value: f64) -> Self {
        Self {
            sum: value,
            compensation: 0.0,
        }
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl AddAssign<f64> for CompensatedSum {
    fn add_assign(&mut self, value: f64) {
        self.add(value);
    }
}

/// Compensated sum of a slice
pub fn compensated_sum(values: &[f64]) -> f64 {
    let mut acc = CompensatedSum::default();
    for &v in values {
        acc += v;
    }
    acc.value()
}

/// Mean and sample standard deviation (n - 1 denominator).
///
/// Two-pass: the mean is computed first, then the squared deviations from it
/// (with a correction term for the rounding error of the mean), the same
/// scheme GSL's `gsl_stats_sd_m` uses. Returns `None` for fewer than two
/// values.
pub fn mean_and_sd(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mean = compensated_sum(values) / n as f64;

    let mut sum_sq = CompensatedSum::default();
    let mut sum_dev = CompensatedSum::default();
    for &v in values {
        let d = v - mean;
        sum_sq += d * d;
        sum_dev += d;
    }
    let correction = sum_dev.value();
    let variance = (sum_sq.value() - correction * correction / n as f64) / (n - 1) as f64;

    Some((mean, variance.max(0.0).sqrt()))
}

/// Incremental arithmetic mean.
///
/// Updated as `mean += (x - mean) / n`, which never forms the raw sum and so
/// stays accurate over very long streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMean {
    mean: f64,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    /// Current mean, `None` before the first value
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
