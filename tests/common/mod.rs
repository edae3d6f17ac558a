// Shared test helpers: synthetic frames, records and a temp store
#![allow(dead_code)]

use dumpscope::decoder::layout::{default_mdg_layout, default_mp_layout};
use dumpscope::dump_repo::DumpRepo;
use dumpscope::models::*;
use tempfile::TempDir;

/// Raw (wire) values indexed by `MpField::index`, all zero except `fields`.
pub fn mp_values(fields: &[(MpField, f64)]) -> [f64; MpField::COUNT] {
    let mut values = [0.0; MpField::COUNT];
    for (field, v) in fields {
        values[field.index()] = *v;
    }
    values
}

pub fn mdg_values(fields: &[(MdgField, f64)]) -> [f64; MdgField::COUNT] {
    let mut values = [0.0; MdgField::COUNT];
    for (field, v) in fields {
        values[field.index()] = *v;
    }
    values
}

/// One well-formed MP frame in the default layout.
pub fn mp_frame(rtd: u32, fields: &[(MpField, f64)]) -> Vec<u8> {
    default_mp_layout().encode(rtd as f64, &mp_values(fields))
}

/// One well-formed MDG frame in the default layout.
pub fn mdg_frame(rtd: u32, fields: &[(MdgField, f64)]) -> Vec<u8> {
    default_mdg_layout().encode(rtd as f64, &mdg_values(fields))
}

/// A frame that keeps its sync signature but fails its checksum.
pub fn corrupt(mut frame: Vec<u8>) -> Vec<u8> {
    let last = frame.len() - 1;
    frame[last] = frame[last].wrapping_add(1);
    frame
}

pub fn concat(frames: &[Vec<u8>]) -> Vec<u8> {
    frames.concat()
}

/// `n` healthy MP frames, one per second starting at rtd 1000.
pub fn mp_dump(n: u32) -> Vec<u8> {
    let frames: Vec<Vec<u8>> = (0..n)
        .map(|i| {
            mp_frame(
                1000 + i,
                &[
                    (MpField::Temperature, 60.0),
                    (MpField::BatteryVoltage, 2400.0),
                    (MpField::BatteryCurrent, 500.0),
                    (MpField::FlowStatus, 1.0),
                    (MpField::MotorCurrentAvg, 1200.0),
                    (MpField::HallPulseCount, 40.0),
                    (MpField::ActuationTime, 150.0),
                ],
            )
        })
        .collect();
    concat(&frames)
}

/// Healthy pump readings in physical units.
pub fn mp_readings() -> MpReadings {
    MpReadings {
        temperature: 60.0,
        reset_counter: 0,
        battery_current: 0.5,
        battery_voltage: 24.0,
        flow_on: true,
        vibration_max_x: 0.1,
        vibration_max_y: 0.1,
        vibration_max_z: 0.1,
        vibration_threshold: 2.0,
        motor_current_min: 1.0,
        motor_current_avg: 1.2,
        motor_current_max: 1.5,
        hall_pulse_count: 40,
        actuation_time: 150.0,
    }
}

pub fn mdg_readings() -> MdgReadings {
    MdgReadings {
        accel_x: 0.0,
        accel_y: 0.0,
        accel_z: 1.0,
        shock_peak_x: 5.0,
        shock_peak_y: 3.0,
        shock_peak_z: 2.0,
        shock_axial_50g: 0,
        shock_axial_100g: 0,
        shock_lateral_50g: 0,
        shock_lateral_100g: 0,
        rpm_min: 100.0,
        rpm_avg: 120.0,
        rpm_max: 140.0,
        sys_voltages: vec![3.3; 7],
        battery_voltage: 28.0,
        sys_currents: vec![0.2; 3],
        gamma_count_rate: 40.0,
        accel_stability: vec![0.0; 4],
        inclination: 12.5,
        azimuth: 270.0,
        corrected_inclination: 12.4,
        corrected_azimuth: 269.8,
        toolface: 90.0,
    }
}

pub fn mp_record(sequence: u64, rtd: i64, mp: MpReadings) -> SensorRecord {
    SensorRecord {
        sequence,
        rtd,
        mp: Some(mp),
        mdg: None,
    }
}

pub fn mdg_record(sequence: u64, rtd: i64, mdg: MdgReadings) -> SensorRecord {
    SensorRecord {
        sequence,
        rtd,
        mp: None,
        mdg: Some(mdg),
    }
}

/// MP records from per-record readings, one second apart.
pub fn mp_series(readings: impl IntoIterator<Item = MpReadings>) -> Vec<SensorRecord> {
    readings
        .into_iter()
        .enumerate()
        .map(|(i, mp)| mp_record(i as u64, i as i64, mp))
        .collect()
}

/// Fresh store in a temp dir. Keep the TempDir alive for the test's duration.
pub async fn temp_repo() -> (TempDir, DumpRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dumps.db");
    let repo = DumpRepo::connect(path.to_str().unwrap(), 4).await.unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

/// Poll until the dump reaches a terminal status (5 s budget).
pub async fn wait_terminal(repo: &DumpRepo, id: i64) -> MemoryDump {
    for _ in 0..500 {
        let dump = repo.get_dump(id).await.unwrap().unwrap();
        if dump.status.is_terminal() {
            return dump;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("dump {} did not reach a terminal status", id);
}
