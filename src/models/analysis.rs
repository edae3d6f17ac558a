// Diagnostic output: issues, overall status, metrics

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

/// Declaration order is report order: critical first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, SchemaRead, SchemaWrite,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Operational,
    Warning,
    Critical,
}

/// Detection category. Declaration order breaks ties between issues of equal severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, SchemaRead, SchemaWrite,
)]
#[serde(rename_all = "camelCase")]
pub enum IssueCategory {
    CommunicationErrors,
    HallPulseErrors,
    InvalidSensorReading,
    TemperatureSpikes,
    BatteryVoltageSpikes,
    BatteryCurrentSpikes,
}

/// One classified anomaly bucket. Only materialized with `count >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub description: String,
    pub explanation: String,
    pub count: u64,
    /// Occurrences as a percentage of the records (or record pairs) the rule looked at.
    pub rate_percent: f64,
    pub first_occurrence: i64,
    pub last_occurrence: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// Adjacent-pair delta tracking for one channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSummary {
    pub threshold: f64,
    pub pairs: u64,
    pub spikes: u64,
    pub average: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMetrics {
    pub temperature: DeltaSummary,
    pub battery_voltage: DeltaSummary,
    pub battery_current: DeltaSummary,
}

/// Counters the analyzer tracks for reporting, whether or not they raise an issue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticMetrics {
    pub total_records: u64,
    pub mp_records: u64,
    pub mdg_records: u64,
    pub merged_records: u64,
    pub communication_errors: u64,
    pub communication_error_rate: f64,
    pub hall_active_records: u64,
    pub hall_pulse_errors: u64,
    pub hall_pulse_total: u64,
    pub invalid_temperature_readings: u64,
    /// Over plausible temperatures only.
    pub temperature: Option<ValueRange>,
    pub deltas: DeltaMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub status: OverallStatus,
    pub critical_count: u64,
    pub warning_count: u64,
    pub issues: Vec<Issue>,
    pub metrics: DiagnosticMetrics,
    /// Unix ms. The only field allowed to differ between two runs on the same records.
    pub generated_at: i64,
}
