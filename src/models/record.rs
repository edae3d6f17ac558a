// Normalized sensor record: common header plus one or both device groups.

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

/// Readings only an MP (motor/pump controller) frame carries. Physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct MpReadings {
    pub temperature: f64,
    pub reset_counter: u64,
    pub battery_current: f64,
    pub battery_voltage: f64,
    pub flow_on: bool,
    pub vibration_max_x: f64,
    pub vibration_max_y: f64,
    pub vibration_max_z: f64,
    pub vibration_threshold: f64,
    pub motor_current_min: f64,
    pub motor_current_avg: f64,
    pub motor_current_max: f64,
    pub hall_pulse_count: u64,
    pub actuation_time: f64,
}

impl MpReadings {
    /// Temperature if it is a plausible measurement (finite, |t| <= sentinel).
    pub fn valid_temperature(&self, sentinel_magnitude: f64) -> Option<f64> {
        is_plausible(self.temperature, sentinel_magnitude).then_some(self.temperature)
    }
}

/// True when `value` is a real measurement rather than an ADC/sensor sentinel.
pub fn is_plausible(value: f64, sentinel_magnitude: f64) -> bool {
    value.is_finite() && value.abs() <= sentinel_magnitude
}

/// Readings only an MDG (multi-sensor downhole gauge) frame carries. Physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct MdgReadings {
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub shock_peak_x: f64,
    pub shock_peak_y: f64,
    pub shock_peak_z: f64,
    pub shock_axial_50g: u64,
    pub shock_axial_100g: u64,
    pub shock_lateral_50g: u64,
    pub shock_lateral_100g: u64,
    pub rpm_min: f64,
    pub rpm_avg: f64,
    pub rpm_max: f64,
    /// System voltage rails 1..=7.
    pub sys_voltages: Vec<f64>,
    pub battery_voltage: f64,
    /// System currents 1..=3.
    pub sys_currents: Vec<f64>,
    pub gamma_count_rate: f64,
    /// Long-term accelerometer stability channels 1..=4.
    pub accel_stability: Vec<f64>,
    pub inclination: f64,
    pub azimuth: f64,
    pub corrected_inclination: f64,
    pub corrected_azimuth: f64,
    pub toolface: f64,
}

impl MdgReadings {
    /// Largest absolute shock peak over the three axes.
    pub fn peak_shock(&self) -> f64 {
        self.shock_peak_x
            .abs()
            .max(self.shock_peak_y.abs())
            .max(self.shock_peak_z.abs())
    }
}

/// Which device groups a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    Mp,
    Mdg,
    Merged,
}

/// One decoded timestep. An absent group is `None`, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    pub sequence: u64,
    pub rtd: i64,
    pub mp: Option<MpReadings>,
    pub mdg: Option<MdgReadings>,
}

impl SensorRecord {
    pub fn origin(&self) -> RecordOrigin {
        match (&self.mp, &self.mdg) {
            (Some(_), Some(_)) => RecordOrigin::Merged,
            (None, Some(_)) => RecordOrigin::Mdg,
            // Records are built with at least one group; MP covers the (unreachable) empty case.
            _ => RecordOrigin::Mp,
        }
    }
}
