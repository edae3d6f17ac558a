// Health analyzer: one pass over the normalized records -> classified issues.
// Output is a pure function of (records, config); only generated_at reads the clock.

mod config;
mod tracker;

pub use config::{AnalysisConfig, DEFAULT_SENTINEL_MAGNITUDE, EscalationRule};

use crate::models::{
    AnalysisResult, DeltaMetrics, DiagnosticMetrics, Issue, IssueCategory, MpReadings,
    OverallStatus, RecordOrigin, SensorRecord, Severity, now_millis,
};
use tracker::{DeltaTracker, Occurrences, RangeTracker, rate_percent};

pub fn analyze(records: &[SensorRecord], config: &AnalysisConfig) -> AnalysisResult {
    analyze_at(records, config, now_millis())
}

/// `analyze` with an explicit generation timestamp (unix ms).
pub fn analyze_at(
    records: &[SensorRecord],
    config: &AnalysisConfig,
    generated_at: i64,
) -> AnalysisResult {
    let sentinel = config.sentinel_magnitude;
    let mut metrics = DiagnosticMetrics {
        total_records: records.len() as u64,
        ..Default::default()
    };

    let mut communication = Occurrences::default();
    let mut hall_errors = Occurrences::default();
    let mut invalid = Occurrences::default();
    let mut temperature = RangeTracker::default();
    let mut temperature_delta =
        DeltaTracker::new(config.temperature_delta_threshold, config.delta_decimals);
    let mut voltage_delta =
        DeltaTracker::new(config.voltage_delta_threshold, config.delta_decimals);
    let mut current_delta =
        DeltaTracker::new(config.current_delta_threshold, config.delta_decimals);
    let mut prev: Option<&MpReadings> = None;

    for record in records {
        match record.origin() {
            RecordOrigin::Mp => metrics.mp_records += 1,
            RecordOrigin::Mdg => metrics.mdg_records += 1,
            RecordOrigin::Merged => {
                metrics.mp_records += 1;
                metrics.merged_records += 1;
            }
        }
        let Some(mp) = record.mp.as_ref() else {
            continue;
        };
        let rtd = record.rtd;

        if mp.reset_counter > 0 {
            communication.record(rtd);
        }

        if mp.hall_pulse_count > 0 {
            metrics.hall_active_records += 1;
            metrics.hall_pulse_total = metrics.hall_pulse_total.saturating_add(mp.hall_pulse_count);
        } else if mp.motor_current_avg > 0.0 {
            hall_errors.record(rtd);
        }

        let temp = mp.valid_temperature(sentinel);
        match temp {
            Some(t) => temperature.push(t),
            None => invalid.record(rtd),
        }

        if let Some(p) = prev {
            if let (Some(a), Some(b)) = (p.valid_temperature(sentinel), temp) {
                temperature_delta.push(a, b, rtd);
            }
            voltage_delta.push(p.battery_voltage, mp.battery_voltage, rtd);
            current_delta.push(p.battery_current, mp.battery_current, rtd);
        }
        prev = Some(mp);
    }

    let mp_records = metrics.mp_records;
    metrics.communication_errors = communication.count;
    metrics.communication_error_rate = rate_percent(communication.count, mp_records);
    metrics.hall_pulse_errors = hall_errors.count;
    metrics.invalid_temperature_readings = invalid.count;
    metrics.temperature = temperature.finish();
    metrics.deltas = DeltaMetrics {
        temperature: temperature_delta.summary(),
        battery_voltage: voltage_delta.summary(),
        battery_current: current_delta.summary(),
    };

    let candidates = [
        build_issue(
            IssueCategory::CommunicationErrors,
            &communication,
            mp_records,
            &config.communication,
            |count, rate| Detail {
                description: "Communication errors".into(),
                explanation: format!(
                    "{count} of {mp_records} pump records report a non-zero reset counter ({rate:.2}%). \
                     The controller restarted or lost its link during the run."
                ),
            },
        ),
        build_issue(
            IssueCategory::HallPulseErrors,
            &hall_errors,
            mp_records,
            &config.hall_pulse,
            |count, rate| Detail {
                description: "Hall sensor pulse errors".into(),
                explanation: format!(
                    "{count} of {mp_records} pump records draw motor current without any hall pulse ({rate:.2}%). \
                     This is the signature of a hall sensor fault or a stalled motor."
                ),
            },
        ),
        build_issue(
            IssueCategory::InvalidSensorReading,
            &invalid,
            mp_records,
            &config.invalid_readings,
            |count, rate| Detail {
                description: "Invalid sensor readings".into(),
                explanation: format!(
                    "{count} temperature readings ({rate:.2}%) are beyond the sensor's physical range \
                     (|t| > {sentinel:e}) and were excluded from temperature statistics."
                ),
            },
        ),
        spike_issue(
            IssueCategory::TemperatureSpikes,
            "Rapid temperature changes",
            "temperature",
            &temperature_delta,
            &config.spikes,
        ),
        spike_issue(
            IssueCategory::BatteryVoltageSpikes,
            "Battery voltage swings",
            "battery voltage",
            &voltage_delta,
            &config.spikes,
        ),
        spike_issue(
            IssueCategory::BatteryCurrentSpikes,
            "Battery current swings",
            "battery current",
            &current_delta,
            &config.spikes,
        ),
    ];

    let mut issues: Vec<Issue> = candidates.into_iter().flatten().collect();
    issues.sort_by_key(|i| (i.severity, i.category));

    let critical_count = issues
        .iter()
        .filter(|i| i.severity == Severity::Critical)
        .count() as u64;
    let warning_count = issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count() as u64;
    let status = if critical_count > 0 {
        OverallStatus::Critical
    } else if !issues.is_empty() {
        OverallStatus::Warning
    } else {
        OverallStatus::Operational
    };

    AnalysisResult {
        status,
        critical_count,
        warning_count,
        issues,
        metrics,
        generated_at,
    }
}

struct Detail {
    description: String,
    explanation: String,
}

fn build_issue(
    category: IssueCategory,
    occurrences: &Occurrences,
    eligible: u64,
    rule: &EscalationRule,
    detail: impl FnOnce(u64, f64) -> Detail,
) -> Option<Issue> {
    let (Some(first), Some(last)) = (occurrences.first, occurrences.last) else {
        return None;
    };
    let rate = rate_percent(occurrences.count, eligible);
    let Detail {
        description,
        explanation,
    } = detail(occurrences.count, rate);
    Some(Issue {
        category,
        severity: rule.classify(rate),
        description,
        explanation,
        count: occurrences.count,
        rate_percent: rate,
        first_occurrence: first,
        last_occurrence: last,
    })
}

fn spike_issue(
    category: IssueCategory,
    description: &str,
    channel: &str,
    tracker: &DeltaTracker,
    rule: &EscalationRule,
) -> Option<Issue> {
    let summary = tracker.summary();
    build_issue(category, &tracker.spikes, tracker.pairs(), rule, |count, rate| Detail {
        description: description.to_string(),
        explanation: format!(
            "{count} of {} consecutive {channel} readings changed by more than {} ({rate:.2}%); \
             largest change {:.3}.",
            summary.pairs,
            summary.threshold,
            summary.max.unwrap_or(0.0)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_records_are_operational() {
        let result = analyze_at(&[], &AnalysisConfig::default(), 42);
        assert_eq!(result.status, OverallStatus::Operational);
        assert!(result.issues.is_empty());
        assert_eq!(result.critical_count, 0);
        assert_eq!(result.warning_count, 0);
        assert_eq!(result.metrics.communication_error_rate, 0.0);
        assert_eq!(result.metrics.temperature, None);
        assert_eq!(result.generated_at, 42);
    }

    #[test]
    fn build_issue_skips_zero_occurrences() {
        let issue = build_issue(
            IssueCategory::CommunicationErrors,
            &Occurrences::default(),
            10,
            &EscalationRule::new(0.0, 25.0),
            |_, _| Detail {
                description: String::new(),
                explanation: String::new(),
            },
        );
        assert!(issue.is_none());
    }
}
