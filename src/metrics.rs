// src/metrics.rs
//
// Statistics over rounds-to-success for the Monte Carlo harness.
// - RunningStats: Welford running mean/variance + min/max.
// - percentile:   linear interpolation over a sorted sample.
//
// Deterministic: feeding the same samples in the same order always yields
// bit-identical results, which the harness relies on for thread-count
// independent summaries.

use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl RunningStats {
    /// Adds a sample if finite. Non-finite samples are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.n += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        let delta = x - self.mean;
        self.mean += delta / (self.n as f64);
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Sample variance (divide by n-1).
    pub fn variance(&self) -> f64 {
        if self.n <= 1 {
            0.0
        } else {
            self.m2 / ((self.n as f64) - 1.0)
        }
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.stddev() / (self.n as f64).sqrt()
        }
    }
}

/// Percentile `p01` in [0, 1] of an ascending sample. NaN if empty.
pub fn percentile(sorted: &[f64], p01: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p01.clamp(0.0, 1.0);
    let idx = p * (sorted.len().saturating_sub(1) as f64);
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = idx - (lo as f64);
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// Summary of a rounds-to-success sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundsSummary {
    pub n: u64,
    pub mean: f64,
    pub stddev: f64,
    pub std_error: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
}

impl RoundsSummary {
    pub fn from_rounds(rounds: &[u32]) -> Self {
        let mut stats = RunningStats::default();
        let mut sorted: Vec<f64> = rounds.iter().map(|&r| r as f64).collect();
        for &r in &sorted {
            stats.add(r);
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            n: stats.n(),
            mean: stats.mean(),
            stddev: stats.stddev(),
            std_error: stats.std_error(),
            min: stats.min(),
            max: stats.max(),
            p50: if sorted.is_empty() { 0.0 } else { percentile(&sorted, 0.50) },
            p95: if sorted.is_empty() { 0.0 } else { percentile(&sorted, 0.95) },
        }
    }
}
