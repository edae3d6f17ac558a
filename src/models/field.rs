// Per-format field identifiers. Used as keys in frame layouts and scale tables.

use serde::{Deserialize, Serialize};

/// A field carried by one frame format.
///
/// `index` is the slot of the field inside a raw frame's value array, so
/// `ALL[f.index()] == f` must hold for every variant.
pub trait FrameField: Copy + Ord + std::fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

/// Motor/pump controller fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MpField {
    Temperature,
    ResetCounter,
    BatteryCurrent,
    BatteryVoltage,
    FlowStatus,
    VibrationMaxX,
    VibrationMaxY,
    VibrationMaxZ,
    VibrationThreshold,
    MotorCurrentMin,
    MotorCurrentAvg,
    MotorCurrentMax,
    HallPulseCount,
    ActuationTime,
}

impl MpField {
    pub const COUNT: usize = 14;
}

impl FrameField for MpField {
    const ALL: &'static [Self] = &[
        MpField::Temperature,
        MpField::ResetCounter,
        MpField::BatteryCurrent,
        MpField::BatteryVoltage,
        MpField::FlowStatus,
        MpField::VibrationMaxX,
        MpField::VibrationMaxY,
        MpField::VibrationMaxZ,
        MpField::VibrationThreshold,
        MpField::MotorCurrentMin,
        MpField::MotorCurrentAvg,
        MpField::MotorCurrentMax,
        MpField::HallPulseCount,
        MpField::ActuationTime,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            MpField::Temperature => "temperature",
            MpField::ResetCounter => "reset_counter",
            MpField::BatteryCurrent => "battery_current",
            MpField::BatteryVoltage => "battery_voltage",
            MpField::FlowStatus => "flow_status",
            MpField::VibrationMaxX => "vibration_max_x",
            MpField::VibrationMaxY => "vibration_max_y",
            MpField::VibrationMaxZ => "vibration_max_z",
            MpField::VibrationThreshold => "vibration_threshold",
            MpField::MotorCurrentMin => "motor_current_min",
            MpField::MotorCurrentAvg => "motor_current_avg",
            MpField::MotorCurrentMax => "motor_current_max",
            MpField::HallPulseCount => "hall_pulse_count",
            MpField::ActuationTime => "actuation_time",
        }
    }
}

/// Multi-sensor downhole gauge fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MdgField {
    AccelX,
    AccelY,
    AccelZ,
    ShockPeakX,
    ShockPeakY,
    ShockPeakZ,
    ShockAxial50g,
    ShockAxial100g,
    ShockLateral50g,
    ShockLateral100g,
    RpmMin,
    RpmAvg,
    RpmMax,
    SysVoltage1,
    SysVoltage2,
    SysVoltage3,
    SysVoltage4,
    SysVoltage5,
    SysVoltage6,
    SysVoltage7,
    BatteryVoltage,
    SysCurrent1,
    SysCurrent2,
    SysCurrent3,
    GammaCountRate,
    AccelStability1,
    AccelStability2,
    AccelStability3,
    AccelStability4,
    Inclination,
    Azimuth,
    CorrectedInclination,
    CorrectedAzimuth,
    Toolface,
}

impl MdgField {
    pub const COUNT: usize = 34;
}

impl FrameField for MdgField {
    const ALL: &'static [Self] = &[
        MdgField::AccelX,
        MdgField::AccelY,
        MdgField::AccelZ,
        MdgField::ShockPeakX,
        MdgField::ShockPeakY,
        MdgField::ShockPeakZ,
        MdgField::ShockAxial50g,
        MdgField::ShockAxial100g,
        MdgField::ShockLateral50g,
        MdgField::ShockLateral100g,
        MdgField::RpmMin,
        MdgField::RpmAvg,
        MdgField::RpmMax,
        MdgField::SysVoltage1,
        MdgField::SysVoltage2,
        MdgField::SysVoltage3,
        MdgField::SysVoltage4,
        MdgField::SysVoltage5,
        MdgField::SysVoltage6,
        MdgField::SysVoltage7,
        MdgField::BatteryVoltage,
        MdgField::SysCurrent1,
        MdgField::SysCurrent2,
        MdgField::SysCurrent3,
        MdgField::GammaCountRate,
        MdgField::AccelStability1,
        MdgField::AccelStability2,
        MdgField::AccelStability3,
        MdgField::AccelStability4,
        MdgField::Inclination,
        MdgField::Azimuth,
        MdgField::CorrectedInclination,
        MdgField::CorrectedAzimuth,
        MdgField::Toolface,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            MdgField::AccelX => "accel_x",
            MdgField::AccelY => "accel_y",
            MdgField::AccelZ => "accel_z",
            MdgField::ShockPeakX => "shock_peak_x",
            MdgField::ShockPeakY => "shock_peak_y",
            MdgField::ShockPeakZ => "shock_peak_z",
            MdgField::ShockAxial50g => "shock_axial50g",
            MdgField::ShockAxial100g => "shock_axial100g",
            MdgField::ShockLateral50g => "shock_lateral50g",
            MdgField::ShockLateral100g => "shock_lateral100g",
            MdgField::RpmMin => "rpm_min",
            MdgField::RpmAvg => "rpm_avg",
            MdgField::RpmMax => "rpm_max",
            MdgField::SysVoltage1 => "sys_voltage1",
            MdgField::SysVoltage2 => "sys_voltage2",
            MdgField::SysVoltage3 => "sys_voltage3",
            MdgField::SysVoltage4 => "sys_voltage4",
            MdgField::SysVoltage5 => "sys_voltage5",
            MdgField::SysVoltage6 => "sys_voltage6",
            MdgField::SysVoltage7 => "sys_voltage7",
            MdgField::BatteryVoltage => "battery_voltage",
            MdgField::SysCurrent1 => "sys_current1",
            MdgField::SysCurrent2 => "sys_current2",
            MdgField::SysCurrent3 => "sys_current3",
            MdgField::GammaCountRate => "gamma_count_rate",
            MdgField::AccelStability1 => "accel_stability1",
            MdgField::AccelStability2 => "accel_stability2",
            MdgField::AccelStability3 => "accel_stability3",
            MdgField::AccelStability4 => "accel_stability4",
            MdgField::Inclination => "inclination",
            MdgField::Azimuth => "azimuth",
            MdgField::CorrectedInclination => "corrected_inclination",
            MdgField::CorrectedAzimuth => "corrected_azimuth",
            MdgField::Toolface => "toolface",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_slices_are_indexed_in_declaration_order() {
        assert_eq!(MpField::ALL.len(), MpField::COUNT);
        assert_eq!(MdgField::ALL.len(), MdgField::COUNT);
        for (i, f) in MpField::ALL.iter().enumerate() {
            assert_eq!(f.index(), i, "{:?}", f);
        }
        for (i, f) in MdgField::ALL.iter().enumerate() {
            assert_eq!(f.index(), i, "{:?}", f);
        }
    }

    #[test]
    fn names_match_serde_keys() {
        for f in MpField::ALL {
            let json = serde_json::to_string(f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
        for f in MdgField::ALL {
            let json = serde_json::to_string(f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
    }
}
