// Decode -> normalize -> analyze + aggregate, for one artifact. CPU-bound and pure; the
// worker runs it on the blocking pool.

use tracing::instrument;

use crate::decoder::{self, DecodeError, DecoderConfig};
use crate::health::{self, AnalysisConfig};
use crate::models::{AnalysisResult, DecodeStats, DumpFormat, SensorRecord, Stats};
use crate::normalizer::{self, NormalizerConfig};
use crate::stats::{self, StatsConfig};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub decoder: DecoderConfig,
    pub normalizer: NormalizerConfig,
    pub analysis: AnalysisConfig,
    pub stats: StatsConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.decoder.validate()?;
        self.normalizer.validate()?;
        self.analysis.validate()?;
        self.stats.validate()?;
        anyhow::ensure!(
            self.stats.sentinel_magnitude == self.analysis.sentinel_magnitude,
            "stats and analysis must use the same sentinel_magnitude, got {} / {}",
            self.stats.sentinel_magnitude,
            self.analysis.sentinel_magnitude
        );
        Ok(())
    }
}

/// Everything published when a dump completes. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDump {
    pub decode_stats: DecodeStats,
    pub records: Vec<SensorRecord>,
    pub analysis: AnalysisResult,
    pub stats: Stats,
}

impl ProcessedDump {
    pub fn format(&self) -> DumpFormat {
        self.decode_stats.format
    }
}

#[instrument(skip_all, fields(bytes = bytes.len(), declared = ?declared))]
pub fn process(
    bytes: &[u8],
    declared: Option<DumpFormat>,
    config: &PipelineConfig,
    generated_at: i64,
) -> Result<ProcessedDump, DecodeError> {
    let decoded = decoder::decode(bytes, declared, &config.decoder)?;
    let records = normalizer::normalize(&decoded.frames, &config.normalizer);
    let analysis = health::analyze_at(&records, &config.analysis, generated_at);
    let stats = stats::aggregate(&records, &config.stats);
    Ok(ProcessedDump {
        decode_stats: decoded.stats,
        records,
        analysis,
        stats,
    })
}
