// Frame decoder: raw dump bytes -> ordered raw frames.
// Every frame starts with its format's sync signature, so one buffer may hold MP and MDG
// regions back to back. Corrupt frames are skipped one aligned frame at a time; short
// tails are dropped.

mod error;
pub mod layout;

pub use error::DecodeError;
pub use layout::{Checksum, Endian, FieldKind, FieldSpec, FrameLayout};

use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{DecodeStats, DumpFormat, FrameField, MdgField, MpField};

/// 50 MiB: the largest artifact the service accepts.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Abort when corrupt / (corrupt + valid) is strictly greater than this.
    pub max_corrupt_ratio: f64,
    pub max_input_bytes: usize,
    pub mp: FrameLayout<MpField>,
    pub mdg: FrameLayout<MdgField>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_corrupt_ratio: 0.5,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            mp: layout::default_mp_layout(),
            mdg: layout::default_mdg_layout(),
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.max_corrupt_ratio),
            "decoder.max_corrupt_ratio must be within 0.0..=1.0, got {}",
            self.max_corrupt_ratio
        );
        anyhow::ensure!(
            self.max_input_bytes > 0,
            "decoder.max_input_bytes must be > 0, got {}",
            self.max_input_bytes
        );
        self.mp.validate("mp")?;
        self.mdg.validate("mdg")?;
        anyhow::ensure!(
            !self.mp.sync.starts_with(&self.mdg.sync) && !self.mdg.sync.starts_with(&self.mp.sync),
            "decoder.mp.sync and decoder.mdg.sync must be distinguishable"
        );
        Ok(())
    }

    fn min_width(&self) -> usize {
        self.mp.width.min(self.mdg.width)
    }

    fn width(&self, format: FrameKind) -> usize {
        match format {
            FrameKind::Mp => self.mp.width,
            FrameKind::Mdg => self.mdg.width,
        }
    }

    fn identify(&self, bytes: &[u8]) -> Option<FrameKind> {
        if self.mp.matches_sync(bytes) {
            Some(FrameKind::Mp)
        } else if self.mdg.matches_sync(bytes) {
            Some(FrameKind::Mdg)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Mp,
    Mdg,
}

/// One raw MP frame: byte offset, raw rtd and unscaled field values.
#[derive(Debug, Clone, PartialEq)]
pub struct MpFrame {
    pub offset: usize,
    pub rtd: f64,
    values: [f64; MpField::COUNT],
}

impl MpFrame {
    pub fn new(offset: usize, rtd: f64, values: [f64; MpField::COUNT]) -> Self {
        Self {
            offset,
            rtd,
            values,
        }
    }

    pub fn raw(&self, field: MpField) -> f64 {
        self.values[field.index()]
    }
}

/// One raw MDG frame: byte offset, raw rtd and unscaled field values.
#[derive(Debug, Clone, PartialEq)]
pub struct MdgFrame {
    pub offset: usize,
    pub rtd: f64,
    values: [f64; MdgField::COUNT],
}

impl MdgFrame {
    pub fn new(offset: usize, rtd: f64, values: [f64; MdgField::COUNT]) -> Self {
        Self {
            offset,
            rtd,
            values,
        }
    }

    pub fn raw(&self, field: MdgField) -> f64 {
        self.values[field.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    Mp(MpFrame),
    Mdg(MdgFrame),
}

impl RawFrame {
    pub fn offset(&self) -> usize {
        match self {
            RawFrame::Mp(f) => f.offset,
            RawFrame::Mdg(f) => f.offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub frames: Vec<RawFrame>,
    pub stats: DecodeStats,
}

/// Decode `bytes` into frames. `declared` is checked against the buffer, never trusted.
pub fn decode(
    bytes: &[u8],
    declared: Option<DumpFormat>,
    config: &DecoderConfig,
) -> Result<Decoded, DecodeError> {
    let len = bytes.len();
    if len > config.max_input_bytes {
        return Err(DecodeError::TooLarge {
            len,
            max: config.max_input_bytes,
        });
    }
    let min = config.min_width();
    if len < min {
        return Err(DecodeError::TooShort { len, min });
    }

    let header = detect_header(bytes, config)?;
    let header_width = config.width(header);
    if len < header_width {
        return Err(DecodeError::TooShort {
            len,
            min: header_width,
        });
    }

    let mut frames = Vec::with_capacity(len / min);
    let mut mp_frames = 0u64;
    let mut mdg_frames = 0u64;
    let mut corrupt = 0u64;
    let mut trailing = 0usize;
    let mut current = header;
    let mut cursor = 0usize;

    while cursor < len {
        let rest = &bytes[cursor..];
        let Some(kind) = config.identify(rest) else {
            let width = config.width(current);
            if rest.len() < width {
                trailing = rest.len();
                break;
            }
            debug!(offset = cursor, width, "frame sync mismatch; skipping frame");
            corrupt += 1;
            cursor += width;
            continue;
        };
        let width = config.width(kind);
        if rest.len() < width {
            trailing = rest.len();
            break;
        }
        current = kind;
        let frame = &rest[..width];
        match parse_frame(kind, cursor, frame, config) {
            Some(raw) => {
                match kind {
                    FrameKind::Mp => mp_frames += 1,
                    FrameKind::Mdg => mdg_frames += 1,
                }
                frames.push(raw);
            }
            None => {
                debug!(offset = cursor, width, "frame consistency check failed; skipping frame");
                corrupt += 1;
            }
        }
        cursor += width;
    }

    let valid = mp_frames + mdg_frames;
    let detected = match (mp_frames > 0, mdg_frames > 0) {
        (true, true) => DumpFormat::Mixed,
        (false, true) => DumpFormat::Mdg,
        (true, false) => DumpFormat::Mp,
        (false, false) => header.into(),
    };
    let stats = DecodeStats {
        format: detected,
        total_bytes: len as u64,
        valid_frames: valid,
        mp_frames,
        mdg_frames,
        corrupt_frames: corrupt,
        trailing_bytes: trailing as u64,
    };
    if stats.corrupt_ratio() > config.max_corrupt_ratio {
        return Err(DecodeError::ExcessiveCorruption {
            corrupt,
            total: valid + corrupt,
        });
    }
    if let Some(declared) = declared
        && declared != detected
    {
        return Err(DecodeError::FormatMismatch { declared, detected });
    }

    info!(
        format = %detected,
        valid_frames = valid,
        corrupt_frames = corrupt,
        trailing_bytes = trailing,
        "dump decoded"
    );
    Ok(Decoded { frames, stats })
}

/// Header signature plus stride confirmation: when the first frame fails its
/// consistency check, the next frame boundary must carry a known signature.
fn detect_header(bytes: &[u8], config: &DecoderConfig) -> Result<FrameKind, DecodeError> {
    let kind = config
        .identify(bytes)
        .ok_or(DecodeError::UnrecognizedFormat)?;
    let width = config.width(kind);
    let Some(first) = bytes.get(..width) else {
        // Too short to confirm; the caller reports TooShort.
        return Ok(kind);
    };
    let checksum_ok = match kind {
        FrameKind::Mp => config.mp.checksum.verify(first),
        FrameKind::Mdg => config.mdg.checksum.verify(first),
    };
    let next = &bytes[width..];
    let stride_ok = next.len() < config.min_width() || config.identify(next).is_some();
    if checksum_ok || stride_ok {
        Ok(kind)
    } else {
        Err(DecodeError::UnrecognizedFormat)
    }
}

fn parse_frame(
    kind: FrameKind,
    offset: usize,
    frame: &[u8],
    config: &DecoderConfig,
) -> Option<RawFrame> {
    match kind {
        FrameKind::Mp => {
            let layout = &config.mp;
            if !layout.checksum.verify(frame) {
                return None;
            }
            let rtd = layout.rtd.read(frame, layout.endian)?;
            let values = layout.read_values(frame)?.try_into().ok()?;
            Some(RawFrame::Mp(MpFrame::new(offset, rtd, values)))
        }
        FrameKind::Mdg => {
            let layout = &config.mdg;
            if !layout.checksum.verify(frame) {
                return None;
            }
            let rtd = layout.rtd.read(frame, layout.endian)?;
            let values = layout.read_values(frame)?.try_into().ok()?;
            Some(RawFrame::Mdg(MdgFrame::new(offset, rtd, values)))
        }
    }
}

impl From<FrameKind> for DumpFormat {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::Mp => DumpFormat::Mp,
            FrameKind::Mdg => DumpFormat::Mdg,
        }
    }
}
