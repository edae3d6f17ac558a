// Memory dump identity, format and lifecycle

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

/// Frame format of a dump; serializes to lowercase JSON (e.g. "mdg").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    Mp,
    Mdg,
    Mixed,
}

impl DumpFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DumpFormat::Mp => "mp",
            DumpFormat::Mdg => "mdg",
            DumpFormat::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp" => Some(DumpFormat::Mp),
            "mdg" => Some(DumpFormat::Mdg),
            "mixed" => Some(DumpFormat::Mixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// pending -> processing -> {completed, error}. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl DumpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DumpStatus::Pending => "pending",
            DumpStatus::Processing => "processing",
            DumpStatus::Completed => "completed",
            DumpStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DumpStatus::Pending),
            "processing" => Some(DumpStatus::Processing),
            "completed" => Some(DumpStatus::Completed),
            "error" => Some(DumpStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DumpStatus::Completed | DumpStatus::Error)
    }
}

impl std::fmt::Display for DumpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status row for one uploaded artifact (the polled status surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDump {
    pub id: i64,
    pub filename: String,
    pub declared_format: Option<DumpFormat>,
    /// Known once the dump completed.
    pub detected_format: Option<DumpFormat>,
    pub size_bytes: u64,
    pub status: DumpStatus,
    pub error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Counters from one decode pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct DecodeStats {
    pub format: DumpFormat,
    pub total_bytes: u64,
    pub valid_frames: u64,
    pub mp_frames: u64,
    pub mdg_frames: u64,
    pub corrupt_frames: u64,
    /// Bytes after the last complete frame (dropped, not corruption).
    pub trailing_bytes: u64,
}

impl DecodeStats {
    pub fn corrupt_ratio(&self) -> f64 {
        let total = self.corrupt_frames + self.valid_frames;
        if total == 0 {
            return 0.0;
        }
        self.corrupt_frames as f64 / total as f64
    }
}
