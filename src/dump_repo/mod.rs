// SQLite dump store. memory_dumps holds the polled status row; dump_outputs holds the
// published results and only exists for completed dumps. Status transitions are guarded
// in SQL so a terminal row never changes.

mod blob;

use crate::models::{
    AnalysisResult, DecodeStats, DumpFormat, DumpStatus, MemoryDump, SensorRecord, Stats,
    now_millis,
};
use crate::pipeline::ProcessedDump;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Message stored on dumps that were in flight when the previous process stopped.
pub const INTERRUPTED_MESSAGE: &str = "interrupted: service stopped before processing finished";

const DUMP_COLUMNS: &str = "id, filename, declared_format, detected_format, size_bytes, status, error, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Dump is still pending or processing.
    InFlight(DumpStatus),
}

pub struct DumpRepo {
    pool: SqlitePool,
}

impl DumpRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_dumps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                declared_format TEXT,
                detected_format TEXT,
                size_bytes INTEGER NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_dumps_created_at ON memory_dumps(created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dump_outputs (
                dump_id INTEGER PRIMARY KEY REFERENCES memory_dumps(id) ON DELETE CASCADE,
                records_data BLOB NOT NULL,
                analysis_data BLOB NOT NULL,
                stats_data BLOB NOT NULL,
                decode_stats_data BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new dump in `pending`.
    #[instrument(skip(self), fields(repo = "dumps", operation = "create_dump"))]
    pub async fn create_dump(
        &self,
        filename: &str,
        declared_format: Option<DumpFormat>,
        size_bytes: u64,
    ) -> anyhow::Result<MemoryDump> {
        let now = now_millis();
        let r = sqlx::query(
            "INSERT INTO memory_dumps (filename, declared_format, detected_format, size_bytes, status, error, created_at, updated_at)
             VALUES ($1, $2, NULL, $3, $4, NULL, $5, $5)",
        )
        .bind(filename)
        .bind(declared_format.map(|f| f.as_str()))
        .bind(size_bytes as i64)
        .bind(DumpStatus::Pending.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(MemoryDump {
            id: r.last_insert_rowid(),
            filename: filename.to_string(),
            declared_format,
            detected_format: None,
            size_bytes,
            status: DumpStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// pending -> processing. False when the dump is gone or no longer pending.
    #[instrument(skip(self), fields(repo = "dumps", operation = "mark_processing"))]
    pub async fn mark_processing(&self, dump_id: i64) -> anyhow::Result<bool> {
        let r = sqlx::query(
            "UPDATE memory_dumps SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
        )
        .bind(DumpStatus::Processing.as_str())
        .bind(now_millis())
        .bind(dump_id)
        .bind(DumpStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() == 1)
    }

    /// processing -> completed together with every output, in one transaction.
    /// Returns false (and writes nothing) when the dump is not processing.
    #[instrument(
        skip(self, processed),
        fields(repo = "dumps", operation = "publish_completed", records_count = processed.records.len())
    )]
    pub async fn publish_completed(
        &self,
        dump_id: i64,
        processed: &ProcessedDump,
    ) -> anyhow::Result<bool> {
        let records_data = blob::with_version_prefix(
            blob::BLOB_VERSION,
            wincode::serialize(&processed.records).map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
        );
        let analysis_data = blob::with_version_prefix(
            blob::BLOB_VERSION,
            wincode::serialize(&processed.analysis)
                .map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
        );
        let stats_data = blob::with_version_prefix(
            blob::BLOB_VERSION,
            wincode::serialize(&processed.stats).map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
        );
        let decode_stats_data = blob::with_version_prefix(
            blob::BLOB_VERSION,
            wincode::serialize(&processed.decode_stats)
                .map_err(|e| anyhow::anyhow!("wincode: {}", e))?,
        );

        let mut tx = self.pool.begin().await?;
        let r = sqlx::query(
            "UPDATE memory_dumps SET status = $1, detected_format = $2, error = NULL, updated_at = $3
             WHERE id = $4 AND status = $5",
        )
        .bind(DumpStatus::Completed.as_str())
        .bind(processed.format().as_str())
        .bind(now_millis())
        .bind(dump_id)
        .bind(DumpStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;
        if r.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO dump_outputs (dump_id, records_data, analysis_data, stats_data, decode_stats_data)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(dump_id)
        .bind(&records_data)
        .bind(&analysis_data)
        .bind(&stats_data)
        .bind(&decode_stats_data)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// pending|processing -> error. False when the dump is already terminal or gone.
    #[instrument(skip(self, message), fields(repo = "dumps", operation = "mark_error"))]
    pub async fn mark_error(&self, dump_id: i64, message: &str) -> anyhow::Result<bool> {
        let r = sqlx::query(
            "UPDATE memory_dumps SET status = $1, error = $2, updated_at = $3
             WHERE id = $4 AND status IN ($5, $6)",
        )
        .bind(DumpStatus::Error.as_str())
        .bind(message)
        .bind(now_millis())
        .bind(dump_id)
        .bind(DumpStatus::Pending.as_str())
        .bind(DumpStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() == 1)
    }

    pub async fn get_dump(&self, dump_id: i64) -> anyhow::Result<Option<MemoryDump>> {
        let row = sqlx::query(&format!("SELECT {} FROM memory_dumps WHERE id = $1", DUMP_COLUMNS))
            .bind(dump_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(parse_dump_row).transpose()
    }

    /// Newest first.
    pub async fn list_dumps(&self) -> anyhow::Result<Vec<MemoryDump>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM memory_dumps ORDER BY created_at DESC, id DESC",
            DUMP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_dump_row).collect()
    }

    /// Published outputs; `None` unless the dump completed.
    #[instrument(skip(self), fields(repo = "dumps", operation = "load_outputs"))]
    pub async fn load_outputs(&self, dump_id: i64) -> anyhow::Result<Option<ProcessedDump>> {
        let row = sqlx::query(
            "SELECT records_data, analysis_data, stats_data, decode_stats_data FROM dump_outputs WHERE dump_id = $1",
        )
        .bind(dump_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let records_data: Vec<u8> = row.try_get("records_data")?;
        let analysis_data: Vec<u8> = row.try_get("analysis_data")?;
        let stats_data: Vec<u8> = row.try_get("stats_data")?;
        let decode_stats_data: Vec<u8> = row.try_get("decode_stats_data")?;

        let records: Vec<SensorRecord> =
            wincode::deserialize(blob::blob_payload(&records_data, "records_data")?)
                .map_err(|e| anyhow::anyhow!("wincode deserialize records: {}", e))?;
        let analysis: AnalysisResult =
            wincode::deserialize(blob::blob_payload(&analysis_data, "analysis_data")?)
                .map_err(|e| anyhow::anyhow!("wincode deserialize analysis: {}", e))?;
        let stats: Stats = wincode::deserialize(blob::blob_payload(&stats_data, "stats_data")?)
            .map_err(|e| anyhow::anyhow!("wincode deserialize stats: {}", e))?;
        let decode_stats: DecodeStats =
            wincode::deserialize(blob::blob_payload(&decode_stats_data, "decode_stats_data")?)
                .map_err(|e| anyhow::anyhow!("wincode deserialize decode stats: {}", e))?;

        Ok(Some(ProcessedDump {
            decode_stats,
            records,
            analysis,
            stats,
        }))
    }

    /// Discard a terminal dump and its outputs.
    #[instrument(skip(self), fields(repo = "dumps", operation = "delete_dump"))]
    pub async fn delete_dump(&self, dump_id: i64) -> anyhow::Result<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM memory_dumps WHERE id = $1")
                .bind(dump_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(status) = status else {
            return Ok(DeleteOutcome::NotFound);
        };
        let status = parse_status(&status)?;
        if !status.is_terminal() {
            return Ok(DeleteOutcome::InFlight(status));
        }
        sqlx::query("DELETE FROM dump_outputs WHERE dump_id = $1")
            .bind(dump_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM memory_dumps WHERE id = $1")
            .bind(dump_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Move dumps a previous process left pending/processing to `error`. Run once at startup.
    #[instrument(skip(self), fields(repo = "dumps", operation = "fail_interrupted"))]
    pub async fn fail_interrupted(&self) -> anyhow::Result<u64> {
        let r = sqlx::query(
            "UPDATE memory_dumps SET status = $1, error = $2, updated_at = $3 WHERE status IN ($4, $5)",
        )
        .bind(DumpStatus::Error.as_str())
        .bind(INTERRUPTED_MESSAGE)
        .bind(now_millis())
        .bind(DumpStatus::Pending.as_str())
        .bind(DumpStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }

    /// Delete terminal dumps created before `cutoff_ms`. Returns the deleted ids.
    #[instrument(skip(self), fields(repo = "dumps", operation = "prune_older_than"))]
    pub async fn prune_older_than(&self, cutoff_ms: i64) -> anyhow::Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM memory_dumps WHERE created_at < $1 AND status IN ($2, $3) ORDER BY id",
        )
        .bind(cutoff_ms)
        .bind(DumpStatus::Completed.as_str())
        .bind(DumpStatus::Error.as_str())
        .fetch_all(&mut *tx)
        .await?;
        for &id in &ids {
            sqlx::query("DELETE FROM dump_outputs WHERE dump_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM memory_dumps WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(ids)
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "dumps", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_status(s: &str) -> anyhow::Result<DumpStatus> {
    DumpStatus::parse(s).ok_or_else(|| anyhow::anyhow!("unknown dump status in store: {}", s))
}

fn parse_format(s: Option<String>) -> anyhow::Result<Option<DumpFormat>> {
    s.map(|s| {
        DumpFormat::parse(&s).ok_or_else(|| anyhow::anyhow!("unknown dump format in store: {}", s))
    })
    .transpose()
}

fn parse_dump_row(row: &SqliteRow) -> anyhow::Result<MemoryDump> {
    let status: String = row.try_get("status")?;
    let size_bytes: i64 = row.try_get("size_bytes")?;
    Ok(MemoryDump {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        declared_format: parse_format(row.try_get("declared_format")?)?,
        detected_format: parse_format(row.try_get("detected_format")?)?,
        size_bytes: size_bytes.max(0) as u64,
        status: parse_status(&status)?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
