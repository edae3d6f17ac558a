// Model serialization tests (JSON casing, wincode roundtrip)

mod common;

use common::*;
use dumpscope::models::*;

#[test]
fn test_memory_dump_serialization_camel_case() {
    let dump = MemoryDump {
        id: 3,
        filename: "run.bin".into(),
        declared_format: Some(DumpFormat::Mixed),
        detected_format: None,
        size_bytes: 1160,
        status: DumpStatus::Processing,
        error: None,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_500,
    };
    let json = serde_json::to_string(&dump).unwrap();
    assert!(json.contains("\"declaredFormat\":\"mixed\""));
    assert!(json.contains("\"detectedFormat\":null"));
    assert!(json.contains("\"sizeBytes\":1160"));
    assert!(json.contains("\"status\":\"processing\""));
    let back: MemoryDump = serde_json::from_str(&json).unwrap();
    assert_eq!(back, dump);
}

#[test]
fn test_sensor_record_absent_group_is_null() {
    let record = mdg_record(4, 120, mdg_readings());
    let json: serde_json::Value = serde_json::to_value(&record).unwrap();
    assert!(json["mp"].is_null());
    assert_eq!(json["mdg"]["gammaCountRate"], 40.0);
    assert_eq!(json["mdg"]["sysVoltages"].as_array().unwrap().len(), 7);
    assert_eq!(record.origin(), RecordOrigin::Mdg);

    let merged = SensorRecord {
        mp: Some(mp_readings()),
        ..record
    };
    assert_eq!(merged.origin(), RecordOrigin::Merged);
}

#[test]
fn test_analysis_enums_serialize_as_report_strings() {
    assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    assert_eq!(serde_json::to_string(&OverallStatus::Operational).unwrap(), "\"operational\"");
    assert_eq!(
        serde_json::to_string(&IssueCategory::HallPulseErrors).unwrap(),
        "\"hallPulseErrors\""
    );
    assert_eq!(serde_json::to_string(&MetricField::PeakShock).unwrap(), "\"peak_shock\"");
    assert!(Severity::Critical < Severity::Warning);
    assert!(Severity::Warning < Severity::Info);
}

#[test]
fn test_records_wincode_roundtrip() {
    let records = vec![
        mp_record(0, 10, mp_readings()),
        mdg_record(1, 11, mdg_readings()),
        SensorRecord {
            sequence: 2,
            rtd: 12,
            mp: Some(mp_readings()),
            mdg: Some(mdg_readings()),
        },
    ];
    let bytes = wincode::serialize(&records).unwrap();
    let back: Vec<SensorRecord> = wincode::deserialize(&bytes).unwrap();
    assert_eq!(back, records);
}

#[test]
fn test_analysis_result_wincode_roundtrip() {
    let analysis = dumpscope::health::analyze_at(
        &mp_series((0..10).map(|i| MpReadings {
            reset_counter: (i % 2) as u64,
            ..mp_readings()
        })),
        &dumpscope::health::AnalysisConfig::default(),
        99,
    );
    assert!(!analysis.issues.is_empty());
    let bytes = wincode::serialize(&analysis).unwrap();
    let back: AnalysisResult = wincode::deserialize(&bytes).unwrap();
    assert_eq!(back, analysis);
}

#[test]
fn test_decode_stats_corrupt_ratio() {
    let stats = DecodeStats {
        format: DumpFormat::Mp,
        total_bytes: 144,
        valid_frames: 3,
        mp_frames: 3,
        mdg_frames: 0,
        corrupt_frames: 1,
        trailing_bytes: 0,
    };
    assert_eq!(stats.corrupt_ratio(), 0.25);
    let empty = DecodeStats {
        valid_frames: 0,
        mp_frames: 0,
        corrupt_frames: 0,
        ..stats
    };
    assert_eq!(empty.corrupt_ratio(), 0.0);
}
