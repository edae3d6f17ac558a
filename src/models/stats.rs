// Report statistics derived from a normalized record sequence

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

use super::SensorRecord;

/// A numeric channel the aggregator can histogram or range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, SchemaRead, SchemaWrite,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Temperature,
    BatteryVoltage,
    BatteryCurrent,
    MotorCurrentAvg,
    ActuationTime,
    RotationRpmAvg,
    GammaCountRate,
    PeakShock,
    Inclination,
    Azimuth,
}

impl MetricField {
    pub const ALL: [MetricField; 10] = [
        MetricField::Temperature,
        MetricField::BatteryVoltage,
        MetricField::BatteryCurrent,
        MetricField::MotorCurrentAvg,
        MetricField::ActuationTime,
        MetricField::RotationRpmAvg,
        MetricField::GammaCountRate,
        MetricField::PeakShock,
        MetricField::Inclination,
        MetricField::Azimuth,
    ];

    /// Value of this metric for `record`, or `None` when the record's device does not
    /// collect it or the reading is not a plausible measurement.
    pub fn value(self, record: &SensorRecord, sentinel_magnitude: f64) -> Option<f64> {
        let v = match self {
            MetricField::Temperature => record.mp.as_ref()?.temperature,
            MetricField::BatteryVoltage => record.mp.as_ref()?.battery_voltage,
            MetricField::BatteryCurrent => record.mp.as_ref()?.battery_current,
            MetricField::MotorCurrentAvg => record.mp.as_ref()?.motor_current_avg,
            MetricField::ActuationTime => record.mp.as_ref()?.actuation_time,
            MetricField::RotationRpmAvg => record.mdg.as_ref()?.rpm_avg,
            MetricField::GammaCountRate => record.mdg.as_ref()?.gamma_count_rate,
            MetricField::PeakShock => record.mdg.as_ref()?.peak_shock(),
            MetricField::Inclination => record.mdg.as_ref()?.inclination,
            MetricField::Azimuth => record.mdg.as_ref()?.azimuth,
        };
        super::is_plausible(v, sentinel_magnitude).then_some(v)
    }
}

/// Pump runtime statistics over MP-bearing records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct PumpStats {
    pub total_records: u64,
    pub runtime_records: u64,
    /// The four below are `None` when no record has flow on.
    pub efficiency_percent: Option<f64>,
    pub avg_motor_current: Option<f64>,
    pub avg_actuation_time: Option<f64>,
    pub max_temperature: Option<f64>,
}

/// `[bin_start, bin_end)` with its sample count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub metric: MetricField,
    pub width: f64,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct MetricRange {
    pub metric: MetricField,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub pump: PumpStats,
    pub histograms: Vec<Histogram>,
    /// Only metrics with at least one value appear.
    pub ranges: Vec<MetricRange>,
    pub high_shock_events: u64,
    pub shock_threshold_g: f64,
}
