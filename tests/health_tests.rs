// Health analyzer: rules, thresholds, severity and ordering

mod common;

use common::*;
use dumpscope::health::{AnalysisConfig, analyze, analyze_at};
use dumpscope::models::{IssueCategory, OverallStatus, Severity};

fn with_temperatures(temps: &[f64]) -> Vec<dumpscope::models::SensorRecord> {
    mp_series(temps.iter().map(|t| dumpscope::models::MpReadings {
        temperature: *t,
        ..mp_readings()
    }))
}

#[test]
fn healthy_run_is_operational() {
    let records = mp_series((0..50).map(|_| mp_readings()));
    let result = analyze(&records, &AnalysisConfig::default());
    assert_eq!(result.status, OverallStatus::Operational);
    assert!(result.issues.is_empty());
    assert_eq!(result.metrics.mp_records, 50);
    assert_eq!(result.metrics.hall_active_records, 50);
    assert_eq!(result.metrics.hall_pulse_total, 50 * 40);
    assert_eq!(result.metrics.deltas.temperature.pairs, 49);
    assert_eq!(result.metrics.deltas.temperature.max, Some(0.0));
}

#[test]
fn every_fifth_reset_gives_twenty_percent_communication_errors() {
    let records = mp_series((0..1000).map(|i| dumpscope::models::MpReadings {
        reset_counter: if i % 5 == 0 { 1 } else { 0 },
        ..mp_readings()
    }));
    let result = analyze_at(&records, &AnalysisConfig::default(), 0);
    assert_eq!(result.metrics.communication_errors, 200);
    assert_eq!(result.metrics.communication_error_rate, 20.0);

    assert_eq!(result.issues.len(), 1);
    let issue = &result.issues[0];
    assert_eq!(issue.category, IssueCategory::CommunicationErrors);
    assert_eq!(issue.count, 200);
    assert_eq!(issue.rate_percent, 20.0);
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.first_occurrence, 0);
    assert_eq!(issue.last_occurrence, 995);
    assert_eq!(result.status, OverallStatus::Warning);
    assert_eq!(result.warning_count, 1);
}

#[test]
fn communication_errors_above_quarter_are_critical() {
    let records = mp_series((0..4).map(|i| dumpscope::models::MpReadings {
        reset_counter: if i < 2 { 3 } else { 0 },
        ..mp_readings()
    }));
    let result = analyze_at(&records, &AnalysisConfig::default(), 0);
    assert_eq!(result.issues[0].severity, Severity::Critical);
    assert_eq!(result.status, OverallStatus::Critical);
    assert_eq!(result.critical_count, 1);
}

#[test]
fn temperature_delta_at_threshold_is_not_a_spike() {
    let result = analyze_at(&with_temperatures(&[20.0, 25.0]), &AnalysisConfig::default(), 0);
    assert_eq!(result.metrics.deltas.temperature.spikes, 0);
    assert!(result.issues.is_empty());

    let result = analyze_at(&with_temperatures(&[20.0, 25.01]), &AnalysisConfig::default(), 0);
    assert_eq!(result.metrics.deltas.temperature.spikes, 1);
    let issue = &result.issues[0];
    assert_eq!(issue.category, IssueCategory::TemperatureSpikes);
    assert_eq!(issue.first_occurrence, 1);
}

#[test]
fn voltage_and_current_deltas_use_strict_thresholds() {
    let voltages = [0.0, 0.5, 1.01];
    let currents = [0.0, 0.1, 0.21];
    let records = mp_series((0..3).map(|i| dumpscope::models::MpReadings {
        battery_voltage: voltages[i],
        battery_current: currents[i],
        ..mp_readings()
    }));
    let result = analyze_at(&records, &AnalysisConfig::default(), 0);
    assert_eq!(result.metrics.deltas.battery_voltage.spikes, 1);
    assert_eq!(result.metrics.deltas.battery_current.spikes, 1);
    assert_eq!(result.metrics.deltas.battery_voltage.pairs, 2);

    let categories: Vec<IssueCategory> = result.issues.iter().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![
            IssueCategory::BatteryVoltageSpikes,
            IssueCategory::BatteryCurrentSpikes
        ]
    );
    // 1 of 2 pairs = 50%
    assert!(result.issues.iter().all(|i| i.severity == Severity::Critical));
}

#[test]
fn sentinel_temperature_is_one_invalid_reading_issue() {
    let result = analyze_at(
        &with_temperatures(&[60.0, 61.0, 1e12, 62.0]),
        &AnalysisConfig::default(),
        0,
    );
    let invalid: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.category == IssueCategory::InvalidSensorReading)
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].count, 1);
    assert_eq!(invalid[0].first_occurrence, 2);
    assert_eq!(result.metrics.invalid_temperature_readings, 1);

    let range = result.metrics.temperature.unwrap();
    assert_eq!(range.max, 62.0);
    assert_eq!(range.min, 60.0);
    // pairs touching the sentinel are skipped for temperature only
    assert_eq!(result.metrics.deltas.temperature.pairs, 1);
    assert_eq!(result.metrics.deltas.temperature.spikes, 0);
    assert_eq!(result.metrics.deltas.battery_voltage.pairs, 3);
}

#[test]
fn non_finite_temperature_is_invalid() {
    let result = analyze_at(
        &with_temperatures(&[f64::NAN, 60.0]),
        &AnalysisConfig::default(),
        0,
    );
    assert_eq!(result.metrics.invalid_temperature_readings, 1);
    assert_eq!(result.metrics.deltas.temperature.pairs, 0);
    assert_eq!(result.metrics.deltas.temperature.average, None);
}

#[test]
fn hall_pulse_fault_needs_motor_current() {
    let records = mp_series([
        dumpscope::models::MpReadings {
            hall_pulse_count: 0,
            motor_current_avg: 1.0,
            ..mp_readings()
        },
        dumpscope::models::MpReadings {
            hall_pulse_count: 0,
            motor_current_avg: 0.0,
            ..mp_readings()
        },
        mp_readings(),
    ]);
    let result = analyze_at(&records, &AnalysisConfig::default(), 0);
    assert_eq!(result.metrics.hall_pulse_errors, 1);
    assert_eq!(result.metrics.hall_active_records, 1);
    let issue = &result.issues[0];
    assert_eq!(issue.category, IssueCategory::HallPulseErrors);
    assert_eq!(issue.rate_percent, 33.33);
    assert_eq!(issue.severity, Severity::Critical);
}

#[test]
fn low_rate_spike_is_info_but_status_is_warning() {
    let mut temps = vec![60.0; 200];
    temps[100] = 70.0;
    let result = analyze_at(&with_temperatures(&temps), &AnalysisConfig::default(), 0);
    // two spikes (up and back down) over 199 pairs = 1.01%
    let issue = &result.issues[0];
    assert_eq!(issue.count, 2);
    assert_eq!(issue.rate_percent, 1.01);
    assert_eq!(issue.severity, Severity::Warning);

    let mut temps = vec![60.0; 400];
    temps[399] = 70.0;
    let result = analyze_at(&with_temperatures(&temps), &AnalysisConfig::default(), 0);
    assert_eq!(result.issues[0].severity, Severity::Info);
    assert_eq!(result.critical_count, 0);
    assert_eq!(result.warning_count, 0);
    assert_eq!(result.status, OverallStatus::Warning);
}

#[test]
fn issues_are_ordered_by_severity_then_category() {
    let mut readings: Vec<_> = (0..100).map(|_| mp_readings()).collect();
    // communication: 1% -> warning
    readings[10].reset_counter = 1;
    // hall pulse: 20% -> critical
    for r in readings.iter_mut().take(20) {
        r.hall_pulse_count = 0;
    }
    let result = analyze_at(&mp_series(readings), &AnalysisConfig::default(), 0);
    let order: Vec<(Severity, IssueCategory)> =
        result.issues.iter().map(|i| (i.severity, i.category)).collect();
    assert_eq!(
        order,
        vec![
            (Severity::Critical, IssueCategory::HallPulseErrors),
            (Severity::Warning, IssueCategory::CommunicationErrors),
        ]
    );
    assert_eq!(result.status, OverallStatus::Critical);
}

#[test]
fn analysis_is_idempotent_except_timestamp() {
    let mut temps: Vec<f64> = (0..300).map(|i| 50.0 + (i % 7) as f64 * 1.3).collect();
    temps[42] = 1e12;
    let records = with_temperatures(&temps);
    let config = AnalysisConfig::default();
    let a = analyze_at(&records, &config, 1);
    let mut b = analyze_at(&records, &config, 2);
    assert_ne!(a, b);
    b.generated_at = 1;
    assert_eq!(a, b);
}

#[test]
fn mdg_only_records_have_no_pump_issues() {
    let records: Vec<_> = (0..10).map(|i| mdg_record(i, i as i64, mdg_readings())).collect();
    let result = analyze_at(&records, &AnalysisConfig::default(), 0);
    assert_eq!(result.status, OverallStatus::Operational);
    assert_eq!(result.metrics.mdg_records, 10);
    assert_eq!(result.metrics.mp_records, 0);
    assert_eq!(result.metrics.communication_error_rate, 0.0);
    assert_eq!(result.metrics.temperature, None);
}

#[test]
fn custom_thresholds_change_classification() {
    let config = AnalysisConfig {
        temperature_delta_threshold: 0.5,
        ..AnalysisConfig::default()
    };
    let result = analyze_at(&with_temperatures(&[20.0, 21.0]), &config, 0);
    assert_eq!(result.issues[0].category, IssueCategory::TemperatureSpikes);
}
