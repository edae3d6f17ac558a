// Physical frame layouts. Offsets, widths, endianness and the consistency check are
// device-firmware specific, so they are configuration; the defaults below describe the
// controller/gauge firmware the service ships against.
//
// Default MP frame (36 bytes, little-endian):
//   0  sync A5 5A | 2 rtd u32 | 6 temperature f32 | 10 reset_counter u16
//   12 battery_current i16 | 14 battery_voltage u16 | 16 flow_status u8
//   17..25 vibration x/y/z/threshold u16 | 25..31 motor current min/avg/max u16
//   31 hall_pulse_count u16 | 33 actuation_time u16 | 35 sum8 checksum
//
// Default MDG frame (80 bytes, little-endian):
//   0  sync C3 3C | 2 rtd u32 | 6 accel x/y/z i16 | 12 shock peak x/y/z u16
//   18 shock counts axial50/axial100/lateral50/lateral100 u16 | 26 rpm min/avg/max u16
//   32 sys voltages 1..7 u16 | 46 battery_voltage u16 | 48 sys currents 1..3 u16
//   54 gamma u32 | 58 accel stability 1..4 i16 | 66 survey (incl, azi, corr incl,
//   corr azi, toolface) u16 | 76..79 reserved | 79 sum8 checksum

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{FrameField, MdgField, MpField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl FieldKind {
    pub fn size(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Per-frame consistency check stored in the frame's last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checksum {
    None,
    /// Wrapping byte sum of everything before the checksum byte.
    #[default]
    Sum8,
    /// XOR of everything before the checksum byte.
    Xor8,
}

impl Checksum {
    pub fn len(self) -> usize {
        match self {
            Checksum::None => 0,
            Checksum::Sum8 | Checksum::Xor8 => 1,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn compute(self, payload: &[u8]) -> u8 {
        match self {
            Checksum::None => 0,
            Checksum::Sum8 => payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)),
            Checksum::Xor8 => payload.iter().fold(0u8, |acc, b| acc ^ b),
        }
    }

    /// `frame` is exactly one frame.
    pub fn verify(self, frame: &[u8]) -> bool {
        match self {
            Checksum::None => true,
            Checksum::Sum8 | Checksum::Xor8 => match frame.split_last() {
                Some((stored, payload)) => self.compute(payload) == *stored,
                None => false,
            },
        }
    }
}

/// Where one raw value lives inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub at: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(at: usize, kind: FieldKind) -> Self {
        Self { at, kind }
    }

    pub fn end(&self) -> usize {
        self.at + self.kind.size()
    }

    /// Raw numeric value, or `None` if the field does not fit in `frame`.
    pub fn read(&self, frame: &[u8], endian: Endian) -> Option<f64> {
        let raw = frame.get(self.at..self.end())?;
        macro_rules! get {
            ($t:ty) => {{
                let bytes = raw.try_into().ok()?;
                let v = match endian {
                    Endian::Little => <$t>::from_le_bytes(bytes),
                    Endian::Big => <$t>::from_be_bytes(bytes),
                };
                v as f64
            }};
        }
        let v = match self.kind {
            FieldKind::U8 => raw[0] as f64,
            FieldKind::U16 => get!(u16),
            FieldKind::I16 => get!(i16),
            FieldKind::U32 => get!(u32),
            FieldKind::I32 => get!(i32),
            FieldKind::F32 => get!(f32),
        };
        Some(v)
    }

    /// Encode `value` into `frame` (used to build synthetic frames). Out-of-range values saturate.
    pub fn write(&self, frame: &mut [u8], endian: Endian, value: f64) {
        let Some(dst) = frame.get_mut(self.at..self.end()) else {
            return;
        };
        macro_rules! put {
            ($t:ty) => {{
                let v = value as $t;
                let bytes = match endian {
                    Endian::Little => v.to_le_bytes(),
                    Endian::Big => v.to_be_bytes(),
                };
                dst.copy_from_slice(&bytes);
            }};
        }
        match self.kind {
            FieldKind::U8 => dst[0] = value as u8,
            FieldKind::U16 => put!(u16),
            FieldKind::I16 => put!(i16),
            FieldKind::U32 => put!(u32),
            FieldKind::I32 => put!(i32),
            FieldKind::F32 => put!(f32),
        }
    }
}

/// Fixed-width frame description for one format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize",
    deserialize = "F: Deserialize<'de> + Ord"
))]
pub struct FrameLayout<F> {
    pub width: usize,
    pub sync: Vec<u8>,
    #[serde(default)]
    pub endian: Endian,
    #[serde(default)]
    pub checksum: Checksum,
    pub rtd: FieldSpec,
    pub fields: BTreeMap<F, FieldSpec>,
}

impl<F: FrameField> FrameLayout<F> {
    pub fn matches_sync(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.sync)
    }

    /// Raw values indexed by `FrameField::index`; `None` if a field falls outside `frame`.
    pub fn read_values(&self, frame: &[u8]) -> Option<Vec<f64>> {
        let mut values = vec![0.0; F::ALL.len()];
        for field in F::ALL {
            let spec = self.fields.get(field)?;
            values[field.index()] = spec.read(frame, self.endian)?;
        }
        Some(values)
    }

    /// Build a well-formed frame (sync, fields, checksum). `values` is indexed like
    /// `read_values`; missing trailing values are written as zero.
    pub fn encode(&self, rtd: f64, values: &[f64]) -> Vec<u8> {
        let mut frame = vec![0u8; self.width];
        frame[..self.sync.len()].copy_from_slice(&self.sync);
        self.rtd.write(&mut frame, self.endian, rtd);
        for field in F::ALL {
            if let Some(spec) = self.fields.get(field) {
                let v = values.get(field.index()).copied().unwrap_or(0.0);
                spec.write(&mut frame, self.endian, v);
            }
        }
        if !self.checksum.is_empty() {
            let last = self.width - 1;
            frame[last] = self.checksum.compute(&frame[..last]);
        }
        frame
    }

    pub fn validate(&self, name: &str) -> anyhow::Result<()> {
        anyhow::ensure!(!self.sync.is_empty(), "decoder.{name}.sync must be non-empty");
        let data_end = self.width.saturating_sub(self.checksum.len());
        anyhow::ensure!(
            data_end > self.sync.len(),
            "decoder.{name}.width must exceed sync + checksum length, got {}",
            self.width
        );
        let check = |key: &str, spec: &FieldSpec| -> anyhow::Result<()> {
            anyhow::ensure!(
                spec.at >= self.sync.len() && spec.end() <= data_end,
                "decoder.{name}.{key} must lie within bytes {}..{}, got {}..{}",
                self.sync.len(),
                data_end,
                spec.at,
                spec.end()
            );
            Ok(())
        };
        check("rtd", &self.rtd)?;
        for field in F::ALL {
            let Some(spec) = self.fields.get(field) else {
                anyhow::bail!("decoder.{name}.fields.{} is missing", field.name());
            };
            check(&format!("fields.{}", field.name()), spec)?;
        }
        Ok(())
    }
}

fn sequential<F: FrameField>(start: usize, kinds: &[(F, FieldKind)]) -> BTreeMap<F, FieldSpec> {
    let mut at = start;
    let mut out = BTreeMap::new();
    for (field, kind) in kinds {
        out.insert(*field, FieldSpec::new(at, *kind));
        at += kind.size();
    }
    out
}

pub fn default_mp_layout() -> FrameLayout<MpField> {
    use FieldKind::*;
    use MpField::*;
    FrameLayout {
        width: 36,
        sync: vec![0xA5, 0x5A],
        endian: Endian::Little,
        checksum: Checksum::Sum8,
        rtd: FieldSpec::new(2, U32),
        fields: sequential(
            6,
            &[
                (Temperature, F32),
                (ResetCounter, U16),
                (BatteryCurrent, I16),
                (BatteryVoltage, U16),
                (FlowStatus, U8),
                (VibrationMaxX, U16),
                (VibrationMaxY, U16),
                (VibrationMaxZ, U16),
                (VibrationThreshold, U16),
                (MotorCurrentMin, U16),
                (MotorCurrentAvg, U16),
                (MotorCurrentMax, U16),
                (HallPulseCount, U16),
                (ActuationTime, U16),
            ],
        ),
    }
}

pub fn default_mdg_layout() -> FrameLayout<MdgField> {
    use FieldKind::*;
    use MdgField::*;
    FrameLayout {
        width: 80,
        sync: vec![0xC3, 0x3C],
        endian: Endian::Little,
        checksum: Checksum::Sum8,
        rtd: FieldSpec::new(2, U32),
        fields: sequential(
            6,
            &[
                (AccelX, I16),
                (AccelY, I16),
                (AccelZ, I16),
                (ShockPeakX, U16),
                (ShockPeakY, U16),
                (ShockPeakZ, U16),
                (ShockAxial50g, U16),
                (ShockAxial100g, U16),
                (ShockLateral50g, U16),
                (ShockLateral100g, U16),
                (RpmMin, U16),
                (RpmAvg, U16),
                (RpmMax, U16),
                (SysVoltage1, U16),
                (SysVoltage2, U16),
                (SysVoltage3, U16),
                (SysVoltage4, U16),
                (SysVoltage5, U16),
                (SysVoltage6, U16),
                (SysVoltage7, U16),
                (BatteryVoltage, U16),
                (SysCurrent1, U16),
                (SysCurrent2, U16),
                (SysCurrent3, U16),
                (GammaCountRate, U32),
                (AccelStability1, I16),
                (AccelStability2, I16),
                (AccelStability3, I16),
                (AccelStability4, I16),
                (Inclination, U16),
                (Azimuth, U16),
                (CorrectedInclination, U16),
                (CorrectedAzimuth, U16),
                (Toolface, U16),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layouts_validate() {
        default_mp_layout().validate("mp").unwrap();
        default_mdg_layout().validate("mdg").unwrap();
    }

    #[test]
    fn default_layouts_end_before_checksum() {
        let mp = default_mp_layout();
        let mp_end = mp.fields.values().map(FieldSpec::end).max().unwrap();
        assert_eq!(mp_end, 35);
        let mdg = default_mdg_layout();
        let mdg_end = mdg.fields.values().map(FieldSpec::end).max().unwrap();
        assert_eq!(mdg_end, 76);
    }

    #[test]
    fn field_read_write_both_endians() {
        let mut frame = [0u8; 8];
        let spec = FieldSpec::new(2, FieldKind::I16);
        spec.write(&mut frame, Endian::Big, -2.0);
        assert_eq!(&frame[2..4], &[0xFF, 0xFE]);
        assert_eq!(spec.read(&frame, Endian::Big), Some(-2.0));
        spec.write(&mut frame, Endian::Little, 300.0);
        assert_eq!(&frame[2..4], &[0x2C, 0x01]);
        assert_eq!(spec.read(&frame, Endian::Little), Some(300.0));
    }

    #[test]
    fn field_read_outside_frame_is_none() {
        let frame = [0u8; 4];
        assert_eq!(FieldSpec::new(2, FieldKind::U32).read(&frame, Endian::Little), None);
    }

    #[test]
    fn checksum_verifies_encoded_frame() {
        let layout = default_mp_layout();
        let mut frame = layout.encode(100.0, &[21.5]);
        assert!(layout.checksum.verify(&frame));
        frame[7] ^= 0x01;
        assert!(!layout.checksum.verify(&frame));
    }

    #[test]
    fn validate_rejects_missing_field_and_overlap() {
        let mut layout = default_mp_layout();
        layout.fields.remove(&MpField::HallPulseCount);
        let err = layout.validate("mp").unwrap_err();
        assert!(err.to_string().contains("hall_pulse_count"));

        let mut layout = default_mp_layout();
        layout.fields.insert(MpField::ActuationTime, FieldSpec::new(34, FieldKind::U16));
        let err = layout.validate("mp").unwrap_err();
        assert!(err.to_string().contains("actuation_time"));
    }
}
