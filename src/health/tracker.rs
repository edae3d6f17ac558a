// Accumulators used by the analyzer while walking the record sequence once.

use crate::models::{DeltaSummary, ValueRange};

/// Occurrence count with first/last rtd.
#[derive(Debug, Clone, Default)]
pub(super) struct Occurrences {
    pub count: u64,
    pub first: Option<i64>,
    pub last: Option<i64>,
}

impl Occurrences {
    pub fn record(&mut self, rtd: i64) {
        self.count += 1;
        if self.first.is_none() {
            self.first = Some(rtd);
        }
        self.last = Some(rtd);
    }
}

/// Absolute deltas between adjacent readings of one channel.
/// Deltas and the threshold are rounded to `decimals` places before comparing, so a
/// scaled step equal to the threshold (0.1 from 1.1 - 1.0) is not a spike.
#[derive(Debug, Clone)]
pub(super) struct DeltaTracker {
    threshold: f64,
    scale: f64,
    pairs: u64,
    sum: f64,
    max: Option<f64>,
    pub spikes: Occurrences,
}

impl DeltaTracker {
    pub fn new(threshold: f64, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            threshold: quantize(threshold, scale),
            scale,
            pairs: 0,
            sum: 0.0,
            max: None,
            spikes: Occurrences::default(),
        }
    }

    /// Non-finite values are skipped.
    pub fn push(&mut self, prev: f64, next: f64, rtd: i64) {
        let delta = quantize((next - prev).abs(), self.scale);
        if !delta.is_finite() {
            return;
        }
        self.pairs += 1;
        self.sum += delta;
        self.max = Some(self.max.map_or(delta, |m| m.max(delta)));
        if delta > self.threshold {
            self.spikes.record(rtd);
        }
    }

    pub fn pairs(&self) -> u64 {
        self.pairs
    }

    pub fn summary(&self) -> DeltaSummary {
        DeltaSummary {
            threshold: self.threshold,
            pairs: self.pairs,
            spikes: self.spikes.count,
            average: (self.pairs > 0).then(|| self.sum / self.pairs as f64),
            max: self.max,
        }
    }
}

fn quantize(v: f64, scale: f64) -> f64 {
    (v * scale).round() / scale
}

#[derive(Debug, Clone, Default)]
pub(super) struct RangeTracker {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RangeTracker {
    pub fn push(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        self.sum += v;
    }

    pub fn finish(&self) -> Option<ValueRange> {
        (self.count > 0).then(|| ValueRange {
            min: self.min,
            max: self.max,
            average: self.sum / self.count as f64,
        })
    }
}

/// Percentage rounded to two decimals; 0 when there is nothing to divide by.
pub(super) fn rate_percent(count: u64, eligible: u64) -> f64 {
    if eligible == 0 {
        return 0.0;
    }
    let rate = count as f64 / eligible as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
