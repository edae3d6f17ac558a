// Domain models: records, dumps, analysis and report statistics

mod analysis;
mod dump;
mod field;
mod record;
mod stats;

pub use analysis::{
    AnalysisResult, DeltaMetrics, DeltaSummary, DiagnosticMetrics, Issue, IssueCategory,
    OverallStatus, Severity, ValueRange,
};
pub use dump::{DecodeStats, DumpFormat, DumpStatus, MemoryDump};
pub use field::{FrameField, MdgField, MpField};
pub use record::{MdgReadings, MpReadings, RecordOrigin, SensorRecord, is_plausible};
pub use stats::{Histogram, HistogramBin, MetricField, MetricRange, PumpStats, Stats};

/// Wall clock in unix milliseconds (0 if the clock is before the epoch).
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
