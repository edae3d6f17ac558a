// Raw -> physical conversion coefficients (physical = raw * scale + offset).
// Defaults pair with the default frame layouts in decoder::layout.

use serde::{Deserialize, Serialize};

use crate::models::{MdgField, MpField};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
}

fn one() -> f64 {
    1.0
}

impl Coefficient {
    pub const IDENTITY: Coefficient = Coefficient {
        scale: 1.0,
        offset: 0.0,
    };

    pub const fn scale(scale: f64) -> Self {
        Self { scale, offset: 0.0 }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }
}

impl Default for Coefficient {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn default_mp_coefficient(field: MpField) -> Coefficient {
    match field {
        // f32 on the wire, already in degC
        MpField::Temperature => Coefficient::IDENTITY,
        MpField::ResetCounter | MpField::FlowStatus | MpField::HallPulseCount => {
            Coefficient::IDENTITY
        }
        // mA -> A
        MpField::BatteryCurrent
        | MpField::MotorCurrentMin
        | MpField::MotorCurrentAvg
        | MpField::MotorCurrentMax => Coefficient::scale(0.001),
        // 10 mV -> V
        MpField::BatteryVoltage => Coefficient::scale(0.01),
        // 0.01 g
        MpField::VibrationMaxX
        | MpField::VibrationMaxY
        | MpField::VibrationMaxZ
        | MpField::VibrationThreshold => Coefficient::scale(0.01),
        // ms
        MpField::ActuationTime => Coefficient::IDENTITY,
    }
}

pub fn default_mdg_coefficient(field: MdgField) -> Coefficient {
    use MdgField::*;
    match field {
        AccelX | AccelY | AccelZ => Coefficient::scale(0.001),
        ShockPeakX | ShockPeakY | ShockPeakZ => Coefficient::scale(0.1),
        ShockAxial50g | ShockAxial100g | ShockLateral50g | ShockLateral100g => {
            Coefficient::IDENTITY
        }
        RpmMin | RpmAvg | RpmMax => Coefficient::IDENTITY,
        SysVoltage1 | SysVoltage2 | SysVoltage3 | SysVoltage4 | SysVoltage5 | SysVoltage6
        | SysVoltage7 | BatteryVoltage => Coefficient::scale(0.01),
        SysCurrent1 | SysCurrent2 | SysCurrent3 => Coefficient::scale(0.001),
        GammaCountRate => Coefficient::IDENTITY,
        AccelStability1 | AccelStability2 | AccelStability3 | AccelStability4 => {
            Coefficient::scale(0.0001)
        }
        Inclination | Azimuth | CorrectedInclination | CorrectedAzimuth | Toolface => {
            Coefficient::scale(0.01)
        }
    }
}

/// Physical count from a scaled value: rounded, negative and NaN clamp to zero.
pub fn to_count(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_scale_and_offset() {
        let c = Coefficient {
            scale: 0.5,
            offset: -10.0,
        };
        assert_eq!(c.apply(40.0), 10.0);
        assert_eq!(Coefficient::IDENTITY.apply(-3.25), -3.25);
    }

    #[test]
    fn to_count_clamps() {
        assert_eq!(to_count(2.6), 3);
        assert_eq!(to_count(-4.0), 0);
        assert_eq!(to_count(f64::NAN), 0);
    }
}
