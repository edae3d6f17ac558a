// Report aggregator: pump runtime, histograms, ranges and shock events.
// Stateless; results do not depend on record order except histogram bin order.

mod histogram;

pub use histogram::histogram;

use serde::Deserialize;

use crate::health::DEFAULT_SENTINEL_MAGNITUDE;
use crate::models::{Histogram, MetricField, MetricRange, PumpStats, SensorRecord, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HistogramSpec {
    pub metric: MetricField,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatsConfig {
    /// A record is a high-shock event when its peak shock is strictly above this (g).
    pub shock_threshold_g: f64,
    /// Not read from the file: taken from `analysis.sentinel_magnitude` so both stages
    /// exclude the same readings.
    #[serde(skip)]
    pub sentinel_magnitude: f64,
    pub histograms: Vec<HistogramSpec>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            shock_threshold_g: 50.0,
            sentinel_magnitude: DEFAULT_SENTINEL_MAGNITUDE,
            histograms: vec![
                HistogramSpec {
                    metric: MetricField::Temperature,
                    width: 5.0,
                },
                HistogramSpec {
                    metric: MetricField::MotorCurrentAvg,
                    width: 0.5,
                },
                HistogramSpec {
                    metric: MetricField::RotationRpmAvg,
                    width: 50.0,
                },
                HistogramSpec {
                    metric: MetricField::GammaCountRate,
                    width: 10.0,
                },
            ],
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.shock_threshold_g.is_finite() && self.shock_threshold_g > 0.0,
            "stats.shock_threshold_g must be > 0, got {}",
            self.shock_threshold_g
        );
        for spec in &self.histograms {
            anyhow::ensure!(
                spec.width.is_finite() && spec.width > 0.0,
                "stats.histograms width for {:?} must be > 0, got {}",
                spec.metric,
                spec.width
            );
        }
        Ok(())
    }
}

pub fn aggregate(records: &[SensorRecord], config: &StatsConfig) -> Stats {
    let sentinel = config.sentinel_magnitude;

    let histograms = config
        .histograms
        .iter()
        .map(|spec| Histogram {
            metric: spec.metric,
            width: spec.width,
            bins: histogram(
                records.iter().filter_map(|r| spec.metric.value(r, sentinel)),
                spec.width,
            ),
        })
        .collect();

    let ranges = MetricField::ALL
        .into_iter()
        .filter_map(|metric| metric_range(records, metric, sentinel))
        .collect();

    let high_shock_events = records
        .iter()
        .filter_map(|r| r.mdg.as_ref())
        .filter(|m| m.peak_shock() > config.shock_threshold_g)
        .count() as u64;

    Stats {
        pump: pump_stats(records, sentinel),
        histograms,
        ranges,
        high_shock_events,
        shock_threshold_g: config.shock_threshold_g,
    }
}

pub fn pump_stats(records: &[SensorRecord], sentinel_magnitude: f64) -> PumpStats {
    let pump: Vec<_> = records.iter().filter_map(|r| r.mp.as_ref()).collect();
    let on: Vec<_> = pump.iter().filter(|m| m.flow_on).collect();
    let total = pump.len() as u64;
    let runtime = on.len() as u64;

    if on.is_empty() {
        return PumpStats {
            total_records: total,
            runtime_records: 0,
            efficiency_percent: None,
            avg_motor_current: None,
            avg_actuation_time: None,
            max_temperature: None,
        };
    }

    let n = on.len() as f64;
    let avg_motor_current = on.iter().map(|m| m.motor_current_avg).sum::<f64>() / n;
    let avg_actuation_time = on.iter().map(|m| m.actuation_time).sum::<f64>() / n;
    let max_temperature = on
        .iter()
        .filter_map(|m| m.valid_temperature(sentinel_magnitude))
        .reduce(f64::max);

    PumpStats {
        total_records: total,
        runtime_records: runtime,
        efficiency_percent: Some(runtime as f64 / total as f64 * 100.0),
        avg_motor_current: Some(avg_motor_current),
        avg_actuation_time: Some(avg_actuation_time),
        max_temperature,
    }
}

fn metric_range(
    records: &[SensorRecord],
    metric: MetricField,
    sentinel_magnitude: f64,
) -> Option<MetricRange> {
    let mut values = records
        .iter()
        .filter_map(|r| metric.value(r, sentinel_magnitude));
    let first = values.next()?;
    let (min, max, count) = values.fold((first, first, 1u64), |(lo, hi, n), v| {
        (lo.min(v), hi.max(v), n + 1)
    });
    Some(MetricRange {
        metric,
        min,
        max,
        count,
    })
}
