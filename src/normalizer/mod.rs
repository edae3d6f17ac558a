// Record normalizer: raw frames -> unified SensorRecord sequence.
// Each record carries only the group its device collects; mixed dumps are merged by rtd.

mod merge;
pub mod scale;

pub use scale::Coefficient;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::decoder::{MdgFrame, MpFrame, RawFrame};
use crate::models::{MdgField, MdgReadings, MpField, MpReadings, SensorRecord};
use merge::Entry;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Max |rtd difference| (seconds) for an MP and an MDG record to be merged.
    pub merge_tolerance_secs: i64,
    /// Device clock ticks -> seconds.
    pub rtd_scale: f64,
    /// Overrides on top of the per-field defaults in `scale`.
    pub mp_coefficients: BTreeMap<MpField, Coefficient>,
    pub mdg_coefficients: BTreeMap<MdgField, Coefficient>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            merge_tolerance_secs: 1,
            rtd_scale: 1.0,
            mp_coefficients: BTreeMap::new(),
            mdg_coefficients: BTreeMap::new(),
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.merge_tolerance_secs >= 0,
            "normalizer.merge_tolerance_secs must be >= 0, got {}",
            self.merge_tolerance_secs
        );
        anyhow::ensure!(
            self.rtd_scale.is_finite() && self.rtd_scale > 0.0,
            "normalizer.rtd_scale must be > 0, got {}",
            self.rtd_scale
        );
        for (field, c) in &self.mp_coefficients {
            anyhow::ensure!(
                c.scale.is_finite() && c.offset.is_finite(),
                "normalizer.mp_coefficients.{:?} must be finite",
                field
            );
        }
        for (field, c) in &self.mdg_coefficients {
            anyhow::ensure!(
                c.scale.is_finite() && c.offset.is_finite(),
                "normalizer.mdg_coefficients.{:?} must be finite",
                field
            );
        }
        Ok(())
    }

    pub fn mp_coefficient(&self, field: MpField) -> Coefficient {
        self.mp_coefficients
            .get(&field)
            .copied()
            .unwrap_or_else(|| scale::default_mp_coefficient(field))
    }

    pub fn mdg_coefficient(&self, field: MdgField) -> Coefficient {
        self.mdg_coefficients
            .get(&field)
            .copied()
            .unwrap_or_else(|| scale::default_mdg_coefficient(field))
    }

    fn rtd(&self, raw: f64) -> i64 {
        (raw * self.rtd_scale).floor() as i64
    }
}

/// Frames -> records ordered by (rtd, byte offset), sequenced from 0.
pub fn normalize(frames: &[RawFrame], config: &NormalizerConfig) -> Vec<SensorRecord> {
    let mut mp = Vec::new();
    let mut mdg = Vec::new();
    for frame in frames {
        let order = frame.offset();
        match frame {
            RawFrame::Mp(f) => mp.push(Entry {
                rtd: config.rtd(f.rtd),
                order,
                mp: Some(mp_readings(f, config)),
                mdg: None,
            }),
            RawFrame::Mdg(f) => mdg.push(Entry {
                rtd: config.rtd(f.rtd),
                order,
                mp: None,
                mdg: Some(mdg_readings(f, config)),
            }),
        }
    }

    let mut entries = if !mp.is_empty() && !mdg.is_empty() {
        merge::merge(mp, mdg, config.merge_tolerance_secs)
    } else {
        mp.extend(mdg);
        mp
    };
    entries.sort_by_key(|e| (e.rtd, e.order));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| SensorRecord {
            sequence: i as u64,
            rtd: e.rtd,
            mp: e.mp,
            mdg: e.mdg,
        })
        .collect()
}

fn mp_readings(frame: &MpFrame, config: &NormalizerConfig) -> MpReadings {
    let v = |field: MpField| config.mp_coefficient(field).apply(frame.raw(field));
    MpReadings {
        temperature: v(MpField::Temperature),
        reset_counter: scale::to_count(v(MpField::ResetCounter)),
        battery_current: v(MpField::BatteryCurrent),
        battery_voltage: v(MpField::BatteryVoltage),
        flow_on: v(MpField::FlowStatus) != 0.0,
        vibration_max_x: v(MpField::VibrationMaxX),
        vibration_max_y: v(MpField::VibrationMaxY),
        vibration_max_z: v(MpField::VibrationMaxZ),
        vibration_threshold: v(MpField::VibrationThreshold),
        motor_current_min: v(MpField::MotorCurrentMin),
        motor_current_avg: v(MpField::MotorCurrentAvg),
        motor_current_max: v(MpField::MotorCurrentMax),
        hall_pulse_count: scale::to_count(v(MpField::HallPulseCount)),
        actuation_time: v(MpField::ActuationTime),
    }
}

fn mdg_readings(frame: &MdgFrame, config: &NormalizerConfig) -> MdgReadings {
    use MdgField::*;
    let v = |field: MdgField| config.mdg_coefficient(field).apply(frame.raw(field));
    MdgReadings {
        accel_x: v(AccelX),
        accel_y: v(AccelY),
        accel_z: v(AccelZ),
        shock_peak_x: v(ShockPeakX),
        shock_peak_y: v(ShockPeakY),
        shock_peak_z: v(ShockPeakZ),
        shock_axial_50g: scale::to_count(v(ShockAxial50g)),
        shock_axial_100g: scale::to_count(v(ShockAxial100g)),
        shock_lateral_50g: scale::to_count(v(ShockLateral50g)),
        shock_lateral_100g: scale::to_count(v(ShockLateral100g)),
        rpm_min: v(RpmMin),
        rpm_avg: v(RpmAvg),
        rpm_max: v(RpmMax),
        sys_voltages: [
            SysVoltage1,
            SysVoltage2,
            SysVoltage3,
            SysVoltage4,
            SysVoltage5,
            SysVoltage6,
            SysVoltage7,
        ]
        .into_iter()
        .map(v)
        .collect(),
        battery_voltage: v(BatteryVoltage),
        sys_currents: [SysCurrent1, SysCurrent2, SysCurrent3]
            .into_iter()
            .map(v)
            .collect(),
        gamma_count_rate: v(GammaCountRate),
        accel_stability: [
            AccelStability1,
            AccelStability2,
            AccelStability3,
            AccelStability4,
        ]
        .into_iter()
        .map(v)
        .collect(),
        inclination: v(Inclination),
        azimuth: v(Azimuth),
        corrected_inclination: v(CorrectedInclination),
        corrected_azimuth: v(CorrectedAzimuth),
        toolface: v(Toolface),
    }
}
